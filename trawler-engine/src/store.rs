use crate::error::{CrawlError, Result};
use crate::queue::{CrawlUrl, UrlStatus};
use std::collections::HashMap;
use url::Url;

pub type NodeId = u64;

/// One depth-tree node per distinct normalized URL ever discovered.
///
/// The parent is held as an id into the node table rather than an owning
/// pointer, so the tree cannot form a retain cycle and nodes are freed
/// independently of traversal order.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub id: NodeId,
    pub url: Url,
    pub depth: usize,
    pub parent: Option<NodeId>,
}

/// Backing store for the depth tree and the crawl frontier.
///
/// The in-memory implementation below is the default; `trawler-core`
/// provides a SQLite-backed one for durability across runs. Implementations
/// are not required to be internally synchronized: all access is serialized
/// through the frontier's lock, which is what makes admission linearizable.
pub trait CrawlStore: Send {
    /// Insert a node for a normalized URL, deriving its depth from the
    /// parent. The caller guarantees the URL is not yet present.
    fn insert_node(&mut self, url: &Url, parent: Option<NodeId>) -> Result<NodeRecord>;

    /// Look up a node by its normalized URL.
    fn node_by_url(&self, url: &Url) -> Result<Option<NodeRecord>>;

    /// Look up a node by id.
    fn node(&self, id: NodeId) -> Result<Option<NodeRecord>>;

    /// Total number of nodes ever discovered.
    fn node_count(&self) -> Result<usize>;

    /// Append a pending entry to the frontier, returning it with its id.
    fn enqueue(&mut self, url: &Url, found_on: Option<&Url>) -> Result<CrawlUrl>;

    /// Claim the next pending entry, marking it `Processing`.
    fn claim_next_pending(&mut self) -> Result<Option<CrawlUrl>>;

    /// Update the status of a frontier entry.
    fn mark_status(&mut self, id: u64, status: UrlStatus) -> Result<()>;

    /// Look up a frontier entry by id.
    fn url_by_id(&self, id: u64) -> Result<Option<CrawlUrl>>;

    /// Number of frontier entries with the given status.
    fn count_by_status(&self, status: UrlStatus) -> Result<usize>;

    /// Total number of frontier entries ever enqueued.
    fn queued_count(&self) -> Result<usize>;
}

/// Default store: everything lives in process memory for the duration of
/// one crawl run.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: Vec<NodeRecord>,
    nodes_by_url: HashMap<String, NodeId>,
    queue: Vec<CrawlUrl>,
    // Entries never revert to Pending, so the claim scan can start where
    // the previous one stopped.
    claim_cursor: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CrawlStore for MemoryStore {
    fn insert_node(&mut self, url: &Url, parent: Option<NodeId>) -> Result<NodeRecord> {
        let depth = match parent {
            Some(parent_id) => {
                let parent_node = self
                    .nodes
                    .get(parent_id as usize)
                    .ok_or_else(|| CrawlError::StoreError(format!("unknown parent node {parent_id}")))?;
                parent_node.depth + 1
            }
            None => 0,
        };

        let node = NodeRecord {
            id: self.nodes.len() as NodeId,
            url: url.clone(),
            depth,
            parent,
        };
        self.nodes_by_url.insert(url.as_str().to_string(), node.id);
        self.nodes.push(node.clone());
        Ok(node)
    }

    fn node_by_url(&self, url: &Url) -> Result<Option<NodeRecord>> {
        Ok(self
            .nodes_by_url
            .get(url.as_str())
            .map(|id| self.nodes[*id as usize].clone()))
    }

    fn node(&self, id: NodeId) -> Result<Option<NodeRecord>> {
        Ok(self.nodes.get(id as usize).cloned())
    }

    fn node_count(&self) -> Result<usize> {
        Ok(self.nodes.len())
    }

    fn enqueue(&mut self, url: &Url, found_on: Option<&Url>) -> Result<CrawlUrl> {
        let entry = CrawlUrl {
            id: self.queue.len() as u64,
            url: url.clone(),
            found_on: found_on.cloned(),
            status: UrlStatus::Pending,
        };
        self.queue.push(entry.clone());
        Ok(entry)
    }

    fn claim_next_pending(&mut self) -> Result<Option<CrawlUrl>> {
        while self.claim_cursor < self.queue.len() {
            let entry = &mut self.queue[self.claim_cursor];
            if entry.status == UrlStatus::Pending {
                entry.status = UrlStatus::Processing;
                return Ok(Some(entry.clone()));
            }
            self.claim_cursor += 1;
        }
        Ok(None)
    }

    fn mark_status(&mut self, id: u64, status: UrlStatus) -> Result<()> {
        let entry = self
            .queue
            .get_mut(id as usize)
            .ok_or_else(|| CrawlError::StoreError(format!("unknown queue entry {id}")))?;
        entry.status = status;
        Ok(())
    }

    fn url_by_id(&self, id: u64) -> Result<Option<CrawlUrl>> {
        Ok(self.queue.get(id as usize).cloned())
    }

    fn count_by_status(&self, status: UrlStatus) -> Result<usize> {
        Ok(self.queue.iter().filter(|entry| entry.status == status).count())
    }

    fn queued_count(&self) -> Result<usize> {
        Ok(self.queue.len())
    }
}
