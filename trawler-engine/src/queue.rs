use crate::error::Result;
use crate::store::{CrawlStore, NodeRecord};
use crate::urls;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlStatus {
    Pending,
    Processing,
    Processed,
}

impl UrlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlStatus::Pending => "pending",
            UrlStatus::Processing => "processing",
            UrlStatus::Processed => "processed",
        }
    }
}

/// A queued unit of work. Created when a URL is admitted, mutated only by
/// the dispatcher (status transitions), never deleted.
#[derive(Debug, Clone)]
pub struct CrawlUrl {
    pub id: u64,
    pub url: Url,
    pub found_on: Option<Url>,
    pub status: UrlStatus,
}

/// Result of a depth-tree admission.
#[derive(Debug, Clone)]
pub struct AdmitReport {
    pub node: NodeRecord,
    pub newly_discovered: bool,
}

/// What a worker gets back when it asks for work.
#[derive(Debug, Clone)]
pub enum Claim {
    Url(CrawlUrl),
    Empty,
    CeilingReached,
}

struct FrontierInner {
    store: Box<dyn CrawlStore>,
    /// Entries handed to workers so far; compared against the page ceiling
    /// in the same critical section as the claim itself.
    claimed: usize,
    /// Claims not yet completed. Workers decrement only after link
    /// extraction has finished enqueueing, so "no pending and nothing in
    /// flight" really means the crawl is drained.
    in_flight: usize,
}

/// The work queue of URLs awaiting fetch, fused with the depth tree that
/// records where each URL was first discovered.
///
/// Every mutating operation takes the single inner lock, which is the
/// serialization point the admission contract requires: two pages
/// discovering the same link concurrently end up with exactly one node and
/// at most one queue entry.
pub struct Frontier {
    inner: Mutex<FrontierInner>,
}

impl Frontier {
    pub fn new(store: Box<dyn CrawlStore>) -> Self {
        Self {
            inner: Mutex::new(FrontierInner {
                store,
                claimed: 0,
                in_flight: 0,
            }),
        }
    }

    /// Insert the seed URL as the depth-tree root and queue it. A seed that
    /// was already planted is left untouched.
    pub async fn seed(&self, url: &Url) -> Result<Option<CrawlUrl>> {
        let mut inner = self.inner.lock().await;
        if inner.store.node_by_url(url)?.is_some() {
            return Ok(None);
        }
        inner.store.insert_node(url, None)?;
        let entry = inner.store.enqueue(url, None)?;
        Ok(Some(entry))
    }

    /// Admit a normalized URL into the depth tree under the page it was
    /// found on. Idempotent: a URL discovered earlier keeps its original
    /// node, whichever edge reached it first. Returns `None` when the
    /// parent page is unknown to the tree, which drops the candidate.
    pub async fn admit(&self, url: &Url, found_on: &Url) -> Result<Option<AdmitReport>> {
        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner.store.node_by_url(url)? {
            return Ok(Some(AdmitReport {
                node: existing,
                newly_discovered: false,
            }));
        }

        let Some(parent_url) = urls::normalize(found_on) else {
            return Ok(None);
        };
        let Some(parent) = inner.store.node_by_url(&parent_url)? else {
            debug!("dropping {}: parent {} not in depth tree", url, found_on);
            return Ok(None);
        };

        let node = inner.store.insert_node(url, Some(parent.id))?;
        Ok(Some(AdmitReport {
            node,
            newly_discovered: true,
        }))
    }

    /// Queue an admitted URL unless the page ceiling has been reached.
    pub async fn enqueue(
        &self,
        url: &Url,
        found_on: &Url,
        maximum_crawl_count: Option<usize>,
    ) -> Result<Option<CrawlUrl>> {
        let mut inner = self.inner.lock().await;
        if let Some(maximum) = maximum_crawl_count
            && inner.store.queued_count()? >= maximum
        {
            return Ok(None);
        }
        let entry = inner.store.enqueue(url, Some(found_on))?;
        Ok(Some(entry))
    }

    /// Hand out the next pending entry, marking it `Processing` and counting
    /// it against the ceiling atomically with the claim.
    pub async fn claim_next(&self, maximum_crawl_count: Option<usize>) -> Result<Claim> {
        let mut inner = self.inner.lock().await;
        if let Some(maximum) = maximum_crawl_count
            && inner.claimed >= maximum
        {
            return Ok(Claim::CeilingReached);
        }
        match inner.store.claim_next_pending()? {
            Some(entry) => {
                inner.claimed += 1;
                inner.in_flight += 1;
                Ok(Claim::Url(entry))
            }
            None => Ok(Claim::Empty),
        }
    }

    /// Mark a claimed entry `Processed` and release its in-flight slot.
    /// Must be called after link extraction for the page has finished.
    pub async fn complete(&self, id: u64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.store.mark_status(id, UrlStatus::Processed)?;
        inner.in_flight = inner.in_flight.saturating_sub(1);
        Ok(())
    }

    /// True once no entry is pending and no claim is outstanding. New work
    /// can only be produced by an outstanding claim, so this is stable.
    pub async fn is_drained(&self) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.in_flight == 0 && inner.store.count_by_status(UrlStatus::Pending)? == 0)
    }

    pub async fn url_by_id(&self, id: u64) -> Result<Option<CrawlUrl>> {
        let inner = self.inner.lock().await;
        inner.store.url_by_id(id)
    }

    pub async fn node_by_url(&self, url: &Url) -> Result<Option<NodeRecord>> {
        let inner = self.inner.lock().await;
        inner.store.node_by_url(url)
    }

    pub async fn queued_count(&self) -> Result<usize> {
        let inner = self.inner.lock().await;
        inner.store.queued_count()
    }

    pub async fn count_by_status(&self, status: UrlStatus) -> Result<usize> {
        let inner = self.inner.lock().await;
        inner.store.count_by_status(status)
    }

    pub async fn node_count(&self) -> Result<usize> {
        let inner = self.inner.lock().await;
        inner.store.node_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    fn frontier() -> Frontier {
        Frontier::new(Box::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_seed_plants_root_and_queues_once() {
        let frontier = frontier();
        let seed = url("https://example.com/");

        let first = frontier.seed(&seed).await.unwrap();
        assert!(first.is_some());
        let again = frontier.seed(&seed).await.unwrap();
        assert!(again.is_none());

        assert_eq!(frontier.queued_count().await.unwrap(), 1);
        let root = frontier.node_by_url(&seed).await.unwrap().unwrap();
        assert_eq!(root.depth, 0);
    }

    #[tokio::test]
    async fn test_admission_is_idempotent_first_writer_wins() {
        let frontier = frontier();
        let seed = url("https://example.com/");
        frontier.seed(&seed).await.unwrap();

        let about = url("https://example.com/about");
        frontier.admit(&about, &seed).await.unwrap();

        let contact = url("https://example.com/contact");
        let first = frontier.admit(&contact, &seed).await.unwrap().unwrap();
        assert!(first.newly_discovered);
        assert_eq!(first.node.depth, 1);

        // Rediscovered from a deeper page: same node, same depth.
        let second = frontier.admit(&contact, &about).await.unwrap().unwrap();
        assert!(!second.newly_discovered);
        assert_eq!(second.node.id, first.node.id);
        assert_eq!(second.node.depth, 1);
    }

    #[tokio::test]
    async fn test_admission_drops_candidates_with_unknown_parent() {
        let frontier = frontier();
        frontier.seed(&url("https://example.com/")).await.unwrap();

        let report = frontier
            .admit(&url("https://example.com/page"), &url("https://elsewhere.com/"))
            .await
            .unwrap();
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_respects_ceiling() {
        let frontier = frontier();
        let seed = url("https://example.com/");
        frontier.seed(&seed).await.unwrap();

        let queued = frontier
            .enqueue(&url("https://example.com/a"), &seed, Some(2))
            .await
            .unwrap();
        assert!(queued.is_some());

        let over = frontier
            .enqueue(&url("https://example.com/b"), &seed, Some(2))
            .await
            .unwrap();
        assert!(over.is_none());
        assert_eq!(frontier.queued_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_claim_stops_at_ceiling() {
        let frontier = frontier();
        let seed = url("https://example.com/");
        frontier.seed(&seed).await.unwrap();
        frontier
            .enqueue(&url("https://example.com/a"), &seed, None)
            .await
            .unwrap();

        let first = frontier.claim_next(Some(1)).await.unwrap();
        assert!(matches!(first, Claim::Url(_)));
        let second = frontier.claim_next(Some(1)).await.unwrap();
        assert!(matches!(second, Claim::CeilingReached));
    }

    #[tokio::test]
    async fn test_drained_only_after_completion() {
        let frontier = frontier();
        let seed = url("https://example.com/");
        frontier.seed(&seed).await.unwrap();

        let Claim::Url(entry) = frontier.claim_next(None).await.unwrap() else {
            panic!("expected a claim");
        };
        assert!(!frontier.is_drained().await.unwrap());

        frontier.complete(entry.id).await.unwrap();
        assert!(frontier.is_drained().await.unwrap());

        let fetched = frontier.url_by_id(entry.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, UrlStatus::Processed);
    }
}
