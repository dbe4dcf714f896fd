pub mod classify;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod observer;
pub mod queue;
pub mod render;
pub mod result;
pub mod robots;
pub mod session;
pub mod store;
pub mod urls;

pub use dispatch::Crawler;
pub use error::{CrawlError, Result};
pub use extract::LinkAdder;
pub use observer::{CrawlObserver, ObserverSet};
pub use queue::{Claim, CrawlUrl, Frontier, UrlStatus};
pub use render::PageRenderer;
pub use result::{CrawlRecord, CrawlSummary, PageResponse};
pub use robots::{PageRobots, RobotsTxt};
pub use session::{CrawlScope, CrawlSession};
pub use store::{CrawlStore, MemoryStore, NodeId, NodeRecord};

#[cfg(feature = "js-rendering")]
pub use render::HeadlessRenderer;
