use crate::classify::process_response;
use crate::error::{CrawlError, Result};
use crate::observer::{CrawlObserver, ObserverSet};
use crate::queue::{Claim, Frontier};
use crate::render::PageRenderer;
use crate::result::CrawlSummary;
use crate::robots::RobotsTxt;
use crate::session::{
    CrawlScope, CrawlSession, DEFAULT_CONCURRENCY, DEFAULT_MAXIMUM_RESPONSE_SIZE,
    DEFAULT_USER_AGENT,
};
use crate::store::{CrawlStore, MemoryStore};
use crate::urls;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Everything a worker needs for one run, injected rather than global.
#[derive(Clone)]
pub(crate) struct CrawlContext {
    pub session: Arc<CrawlSession>,
    pub frontier: Arc<Frontier>,
    pub observers: ObserverSet,
    pub robots: Option<Arc<RobotsTxt>>,
    pub renderer: Option<Arc<dyn PageRenderer>>,
    pub client: Client,
}

/// The crawl dispatcher: drains the frontier with a fixed pool of fetch
/// slots until no work is pending and nothing is in flight, or the page
/// ceiling is reached.
pub struct Crawler {
    frontier: Arc<Frontier>,
    observers: ObserverSet,
    renderer: Option<Arc<dyn PageRenderer>>,
    scope: CrawlScope,
    maximum_depth: Option<usize>,
    maximum_crawl_count: Option<usize>,
    delay_between_requests: Duration,
    maximum_response_size: usize,
    parseable_mime_types: Vec<String>,
    respect_robots: bool,
    concurrency: usize,
    user_agent: String,
    timeout_secs: u64,
}

impl Crawler {
    pub fn new() -> Self {
        Self {
            frontier: Arc::new(Frontier::new(Box::new(MemoryStore::new()))),
            observers: ObserverSet::new(),
            renderer: None,
            scope: CrawlScope::SingleHost,
            maximum_depth: None,
            maximum_crawl_count: None,
            delay_between_requests: Duration::ZERO,
            maximum_response_size: DEFAULT_MAXIMUM_RESPONSE_SIZE,
            parseable_mime_types: Vec::new(),
            respect_robots: true,
            concurrency: DEFAULT_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }

    /// Swap in a different backing store for the depth tree and frontier.
    pub fn with_store(mut self, store: Box<dyn CrawlStore>) -> Self {
        self.frontier = Arc::new(Frontier::new(store));
        self
    }

    pub fn with_scope(mut self, scope: CrawlScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_maximum_depth(mut self, depth: usize) -> Self {
        self.maximum_depth = Some(depth);
        self
    }

    pub fn with_maximum_crawl_count(mut self, count: usize) -> Self {
        self.maximum_crawl_count = Some(count);
        self
    }

    pub fn with_delay_between_requests(mut self, delay: Duration) -> Self {
        self.delay_between_requests = delay;
        self
    }

    pub fn with_maximum_response_size(mut self, bytes: usize) -> Self {
        self.maximum_response_size = bytes;
        self
    }

    pub fn with_parseable_mime_types(mut self, mime_types: Vec<String>) -> Self {
        self.parseable_mime_types = mime_types;
        self
    }

    pub fn ignore_robots(mut self) -> Self {
        self.respect_robots = false;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Replace fetched bodies with externally rendered DOM output.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn add_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observers.register(observer);
        self
    }

    /// Crawl from a seed URL until the frontier drains or the page ceiling
    /// is reached. Observers are notified along the way and `finished` fires
    /// once when the pool shuts down.
    pub async fn crawl(&self, seed: &str) -> Result<CrawlSummary> {
        let parsed = Url::parse(seed)
            .map_err(|error| CrawlError::InvalidUrl(format!("{seed}: {error}")))?;
        let base_url = urls::normalize(&parsed)
            .ok_or_else(|| CrawlError::InvalidUrl(format!("{seed}: not a crawlable scheme")))?;

        info!(
            "Starting crawl of {} with {} workers",
            base_url, self.concurrency
        );

        let client = Client::builder()
            .user_agent(&self.user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.timeout_secs.div_ceil(2)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        let robots = if self.respect_robots {
            Some(Arc::new(fetch_robots(&client, &base_url).await))
        } else {
            None
        };

        let session = Arc::new(CrawlSession {
            base_url: base_url.clone(),
            scope: self.scope.clone(),
            maximum_depth: self.maximum_depth,
            maximum_crawl_count: self.maximum_crawl_count,
            delay_between_requests: self.delay_between_requests,
            maximum_response_size: self.maximum_response_size,
            parseable_mime_types: self.parseable_mime_types.clone(),
            respect_robots: self.respect_robots,
            concurrency: self.concurrency,
            user_agent: self.user_agent.clone(),
            execute_javascript: self.renderer.is_some(),
        });

        self.frontier.seed(&base_url).await?;

        let context = CrawlContext {
            session,
            frontier: self.frontier.clone(),
            observers: self.observers.clone(),
            robots,
            renderer: self.renderer.clone(),
            client,
        };

        let mut handles = Vec::new();
        for worker_id in 0..self.concurrency {
            let ctx = context.clone();
            handles.push(tokio::spawn(worker_loop(worker_id, ctx)));
        }

        for joined in futures::future::join_all(handles).await {
            joined??;
        }

        self.observers.notify_finished().await;

        let summary = CrawlSummary {
            pages_processed: self
                .frontier
                .count_by_status(crate::queue::UrlStatus::Processed)
                .await?,
            urls_queued: self.frontier.queued_count().await?,
            urls_discovered: self.frontier.node_count().await?,
        };
        info!(
            "Crawl complete. Processed {} pages, discovered {} urls",
            summary.pages_processed, summary.urls_discovered
        );
        Ok(summary)
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

/// One fetch slot. Claims, fetches, classifies, then waits out the
/// inter-request delay before the slot is reused. Exits when the ceiling
/// is hit or the frontier is drained.
async fn worker_loop(worker_id: usize, ctx: CrawlContext) -> Result<()> {
    debug!("Worker {} started", worker_id);

    loop {
        match ctx
            .frontier
            .claim_next(ctx.session.maximum_crawl_count)
            .await?
        {
            Claim::CeilingReached => {
                debug!("Worker {} stopping: page ceiling reached", worker_id);
                break;
            }
            Claim::Empty => {
                if ctx.frontier.is_drained().await? {
                    debug!("Worker {} exiting", worker_id);
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Claim::Url(crawl_url) => {
                let started = Instant::now();
                let fetched = match ctx.client.get(crawl_url.url.clone()).send().await {
                    Ok(response) => response.error_for_status(),
                    Err(error) => Err(error),
                };
                let processed = match fetched {
                    Ok(response) => process_response(&ctx, &crawl_url, response, started).await,
                    Err(error) => {
                        report_failure(&ctx, &crawl_url, error.into()).await;
                        Ok(())
                    }
                };

                // The slot is released even when classification errored, so
                // drain detection stays truthful.
                ctx.frontier.complete(crawl_url.id).await?;
                processed?;

                if !ctx.session.delay_between_requests.is_zero() {
                    tokio::time::sleep(ctx.session.delay_between_requests).await;
                }
            }
        }
    }

    Ok(())
}

async fn report_failure(ctx: &CrawlContext, crawl_url: &crate::queue::CrawlUrl, error: CrawlError) {
    warn!("Fetch failed for {}: {}", crawl_url.url, error);
    ctx.observers.notify_failed(crawl_url, &error).await;
}

/// Fetch robots.txt from the seed origin. Anything but a success response
/// degrades to allow-all.
async fn fetch_robots(client: &Client, base_url: &Url) -> RobotsTxt {
    let mut robots_url = base_url.clone();
    robots_url.set_path("/robots.txt");
    robots_url.set_query(None);

    match client.get(robots_url.clone()).send().await {
        Ok(response) if response.status().is_success() => {
            let content = response.text().await.unwrap_or_default();
            RobotsTxt::parse(&content)
        }
        _ => {
            debug!("No robots.txt at {}, allowing all", robots_url);
            RobotsTxt::allow_all()
        }
    }
}
