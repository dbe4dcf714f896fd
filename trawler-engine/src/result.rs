use crate::queue::CrawlUrl;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// What a fetch produced, after classification: final location, status,
/// the headers the pipeline cares about and a size-capped body. Exists for
/// one classify/extract cycle; observers receive a view.
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// The URL that was asked for.
    pub url: Url,
    /// Where the response actually came from, after any redirects.
    pub final_url: Url,
    pub redirected: bool,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub robots_header: Option<String>,
    /// Body capped at the session's maximum response size. Empty when the
    /// content type is not in the parseable set.
    pub body: String,
    pub response_time: Duration,
}

/// Serializable per-page summary for reports and exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub url: String,
    pub final_url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub found_on: Option<String>,
    pub body_bytes: usize,
    pub response_time: Duration,
    pub error: Option<String>,
}

impl CrawlRecord {
    pub fn from_page(crawl_url: &CrawlUrl, page: &PageResponse) -> Self {
        Self {
            url: crawl_url.url.to_string(),
            final_url: page.final_url.to_string(),
            status_code: page.status_code,
            content_type: page.content_type.clone(),
            found_on: crawl_url.found_on.as_ref().map(|u| u.to_string()),
            body_bytes: page.body.len(),
            response_time: page.response_time,
            error: None,
        }
    }

    pub fn from_failure(crawl_url: &CrawlUrl, error: String) -> Self {
        Self {
            url: crawl_url.url.to_string(),
            final_url: crawl_url.url.to_string(),
            status_code: 0,
            content_type: None,
            found_on: crawl_url.found_on.as_ref().map(|u| u.to_string()),
            body_bytes: 0,
            response_time: Duration::from_secs(0),
            error: Some(error),
        }
    }
}

/// Totals for one finished crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub pages_processed: usize,
    pub urls_queued: usize,
    pub urls_discovered: usize,
}
