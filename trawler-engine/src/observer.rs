use crate::error::CrawlError;
use crate::queue::CrawlUrl;
use crate::result::PageResponse;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// An external listener notified of crawl outcomes per URL.
///
/// Observer failures are isolated: an error returned here is logged and
/// never halts other observers, the page, or the crawl.
#[async_trait]
pub trait CrawlObserver: Send + Sync {
    /// A page was fetched and judged indexable.
    async fn crawled(&self, crawl_url: &CrawlUrl, page: &PageResponse) -> anyhow::Result<()>;

    /// A fetch failed. The entry is marked processed and not retried.
    async fn failed(&self, crawl_url: &CrawlUrl, error: &CrawlError) -> anyhow::Result<()>;

    /// The dispatch loop has terminated.
    async fn finished(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Registered observers, notified in registration order.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn CrawlObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Arc<dyn CrawlObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub async fn notify_crawled(&self, crawl_url: &CrawlUrl, page: &PageResponse) {
        for observer in &self.observers {
            if let Err(error) = observer.crawled(crawl_url, page).await {
                warn!("crawl observer error for {}: {:#}", crawl_url.url, error);
            }
        }
    }

    pub async fn notify_failed(&self, crawl_url: &CrawlUrl, error: &CrawlError) {
        for observer in &self.observers {
            if let Err(observer_error) = observer.failed(crawl_url, error).await {
                warn!(
                    "failure observer error for {}: {:#}",
                    crawl_url.url, observer_error
                );
            }
        }
    }

    pub async fn notify_finished(&self) {
        for observer in &self.observers {
            if let Err(error) = observer.finished().await {
                warn!("finish observer error: {:#}", error);
            }
        }
    }
}
