use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use trawler_engine::error::{CrawlError, Result};
use trawler_engine::queue::{CrawlUrl, UrlStatus};
use trawler_engine::store::{CrawlStore, NodeId, NodeRecord};
use url::Url;

/// SQLite-backed depth tree and frontier, for crawls that should survive a
/// process restart. Drop-in replacement for the engine's in-memory store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(store_err)?;

        // Optimize for concurrent writes
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )
        .map_err(store_err)?;

        let store = SqliteStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            -- Depth tree: one row per distinct normalized URL
            CREATE TABLE IF NOT EXISTS nodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE,
                depth INTEGER NOT NULL DEFAULT 0,
                parent_id INTEGER,
                discovered_at INTEGER NOT NULL,
                FOREIGN KEY(parent_id) REFERENCES nodes(id)
            );

            CREATE INDEX IF NOT EXISTS idx_nodes_url ON nodes(url);

            -- Frontier: append-only work queue
            CREATE TABLE IF NOT EXISTS queue (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                found_on TEXT,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK(status IN ('pending', 'processing', 'processed')),
                enqueued_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_queue_status ON queue(status);
            ",
            )
            .map_err(store_err)
    }

    fn node_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, i64, Option<i64>)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn to_node(raw: (i64, String, i64, Option<i64>)) -> Result<NodeRecord> {
        let (id, url, depth, parent) = raw;
        Ok(NodeRecord {
            id: id as NodeId,
            url: parse_url(&url)?,
            depth: depth as usize,
            parent: parent.map(|p| p as NodeId),
        })
    }

    fn url_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, Option<String>, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn to_crawl_url(raw: (i64, String, Option<String>, String)) -> Result<CrawlUrl> {
        let (id, url, found_on, status) = raw;
        Ok(CrawlUrl {
            id: id as u64,
            url: parse_url(&url)?,
            found_on: found_on.as_deref().map(parse_url).transpose()?,
            status: parse_status(&status)?,
        })
    }
}

impl CrawlStore for SqliteStore {
    fn insert_node(&mut self, url: &Url, parent: Option<NodeId>) -> Result<NodeRecord> {
        let depth: i64 = match parent {
            Some(parent_id) => {
                let parent_depth: Option<i64> = self
                    .conn
                    .query_row(
                        "SELECT depth FROM nodes WHERE id = ?1",
                        params![parent_id as i64],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(store_err)?;
                parent_depth
                    .ok_or_else(|| CrawlError::StoreError(format!("unknown parent node {parent_id}")))?
                    + 1
            }
            None => 0,
        };

        self.conn
            .execute(
                "INSERT INTO nodes (url, depth, parent_id, discovered_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    url.as_str(),
                    depth,
                    parent.map(|p| p as i64),
                    Utc::now().timestamp()
                ],
            )
            .map_err(store_err)?;

        Ok(NodeRecord {
            id: self.conn.last_insert_rowid() as NodeId,
            url: url.clone(),
            depth: depth as usize,
            parent,
        })
    }

    fn node_by_url(&self, url: &Url) -> Result<Option<NodeRecord>> {
        self.conn
            .query_row(
                "SELECT id, url, depth, parent_id FROM nodes WHERE url = ?1",
                params![url.as_str()],
                Self::node_from_row,
            )
            .optional()
            .map_err(store_err)?
            .map(Self::to_node)
            .transpose()
    }

    fn node(&self, id: NodeId) -> Result<Option<NodeRecord>> {
        self.conn
            .query_row(
                "SELECT id, url, depth, parent_id FROM nodes WHERE id = ?1",
                params![id as i64],
                Self::node_from_row,
            )
            .optional()
            .map_err(store_err)?
            .map(Self::to_node)
            .transpose()
    }

    fn node_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))
            .map_err(store_err)?;
        Ok(count as usize)
    }

    fn enqueue(&mut self, url: &Url, found_on: Option<&Url>) -> Result<CrawlUrl> {
        self.conn
            .execute(
                "INSERT INTO queue (url, found_on, status, enqueued_at) VALUES (?1, ?2, 'pending', ?3)",
                params![
                    url.as_str(),
                    found_on.map(|u| u.as_str()),
                    Utc::now().timestamp()
                ],
            )
            .map_err(store_err)?;

        Ok(CrawlUrl {
            id: self.conn.last_insert_rowid() as u64,
            url: url.clone(),
            found_on: found_on.cloned(),
            status: UrlStatus::Pending,
        })
    }

    fn claim_next_pending(&mut self) -> Result<Option<CrawlUrl>> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, url, found_on, status FROM queue
                 WHERE status = 'pending' ORDER BY id LIMIT 1",
                [],
                Self::url_from_row,
            )
            .optional()
            .map_err(store_err)?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        self.conn
            .execute(
                "UPDATE queue SET status = 'processing' WHERE id = ?1",
                params![raw.0],
            )
            .map_err(store_err)?;

        let mut entry = Self::to_crawl_url(raw)?;
        entry.status = UrlStatus::Processing;
        Ok(Some(entry))
    }

    fn mark_status(&mut self, id: u64, status: UrlStatus) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE queue SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id as i64],
            )
            .map_err(store_err)?;
        if updated == 0 {
            return Err(CrawlError::StoreError(format!("unknown queue entry {id}")));
        }
        Ok(())
    }

    fn url_by_id(&self, id: u64) -> Result<Option<CrawlUrl>> {
        self.conn
            .query_row(
                "SELECT id, url, found_on, status FROM queue WHERE id = ?1",
                params![id as i64],
                Self::url_from_row,
            )
            .optional()
            .map_err(store_err)?
            .map(Self::to_crawl_url)
            .transpose()
    }

    fn count_by_status(&self, status: UrlStatus) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM queue WHERE status = ?1",
                params![status.as_str()],
                |row| row.get(0),
            )
            .map_err(store_err)?;
        Ok(count as usize)
    }

    fn queued_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM queue", [], |row| row.get(0))
            .map_err(store_err)?;
        Ok(count as usize)
    }
}

fn store_err(error: rusqlite::Error) -> CrawlError {
    CrawlError::StoreError(error.to_string())
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|error| CrawlError::StoreError(format!("stored url {raw}: {error}")))
}

fn parse_status(raw: &str) -> Result<UrlStatus> {
    match raw {
        "pending" => Ok(UrlStatus::Pending),
        "processing" => Ok(UrlStatus::Processing),
        "processed" => Ok(UrlStatus::Processed),
        other => Err(CrawlError::StoreError(format!("unknown status {other}"))),
    }
}
