use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Trawler/0.2 (https://github.com/trapdoorsec/trawler)";
pub const DEFAULT_MAXIMUM_RESPONSE_SIZE: usize = 2 * 1024 * 1024;
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Which pages may have their outbound links followed, relative to the
/// crawl base. Scope never stops a queued page from being fetched; it only
/// gates link extraction, so an off-host page reached through a link or a
/// redirect is still reported to observers.
#[derive(Clone)]
pub enum CrawlScope {
    /// Follow links only on pages whose final host equals the base host.
    SingleHost,
    /// Follow links on the base host and any of its subdomains.
    SubdomainInclusive,
    /// Caller-supplied predicate over the page's final URL.
    Custom(Arc<dyn Fn(&Url) -> bool + Send + Sync>),
}

impl CrawlScope {
    pub fn may_follow_links_on(&self, final_url: &Url, base_url: &Url) -> bool {
        match self {
            CrawlScope::SingleHost => final_url.host_str() == base_url.host_str(),
            CrawlScope::SubdomainInclusive => {
                match (final_url.host_str(), base_url.host_str()) {
                    (Some(host), Some(base)) => {
                        host == base || host.ends_with(&format!(".{base}"))
                    }
                    _ => false,
                }
            }
            CrawlScope::Custom(predicate) => predicate(final_url),
        }
    }
}

impl fmt::Debug for CrawlScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlScope::SingleHost => write!(f, "SingleHost"),
            CrawlScope::SubdomainInclusive => write!(f, "SubdomainInclusive"),
            CrawlScope::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Immutable configuration for one crawl run, assembled by the dispatcher
/// and injected into every component that needs it.
#[derive(Debug, Clone)]
pub struct CrawlSession {
    pub base_url: Url,
    pub scope: CrawlScope,
    pub maximum_depth: Option<usize>,
    pub maximum_crawl_count: Option<usize>,
    pub delay_between_requests: Duration,
    pub maximum_response_size: usize,
    /// Content-type substrings whose bodies may be parsed. Empty allows
    /// everything.
    pub parseable_mime_types: Vec<String>,
    pub respect_robots: bool,
    pub concurrency: usize,
    pub user_agent: String,
    pub execute_javascript: bool,
}
