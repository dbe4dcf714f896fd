use crate::store::SqliteStore;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::warn;
use trawler_engine::{
    Crawler, CrawlError, CrawlObserver, CrawlRecord, CrawlScope, CrawlUrl, PageResponse,
};

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub urls: Vec<String>,
    pub concurrency: usize,
    pub max_depth: Option<usize>,
    pub max_pages: Option<usize>,
    pub delay: Duration,
    pub max_response_bytes: usize,
    pub include_subdomains: bool,
    pub respect_robots: bool,
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
    /// Persist the frontier and depth tree to this SQLite database instead
    /// of keeping them in memory.
    pub store_path: Option<PathBuf>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            concurrency: trawler_engine::session::DEFAULT_CONCURRENCY,
            max_depth: None,
            max_pages: None,
            delay: Duration::ZERO,
            max_response_bytes: trawler_engine::session::DEFAULT_MAXIMUM_RESPONSE_SIZE,
            include_subdomains: false,
            respect_robots: true,
            user_agent: None,
            timeout_secs: 30,
            show_progress_bars: false,
            store_path: None,
        }
    }
}

/// Observer that collects one record per crawled or failed page.
#[derive(Default)]
struct CollectingObserver {
    records: StdMutex<Vec<CrawlRecord>>,
}

impl CollectingObserver {
    fn take(&self) -> Vec<CrawlRecord> {
        std::mem::take(&mut *self.records.lock().unwrap())
    }
}

#[async_trait]
impl CrawlObserver for CollectingObserver {
    async fn crawled(&self, crawl_url: &CrawlUrl, page: &PageResponse) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap()
            .push(CrawlRecord::from_page(crawl_url, page));
        Ok(())
    }

    async fn failed(&self, crawl_url: &CrawlUrl, error: &CrawlError) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap()
            .push(CrawlRecord::from_failure(crawl_url, error.to_string()));
        Ok(())
    }
}

/// Observer that drives an indicatif spinner while pages come in.
struct SpinnerObserver {
    bar: ProgressBar,
    processed: Arc<AtomicUsize>,
}

impl SpinnerObserver {
    fn tick(&self) {
        let count = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        self.bar
            .set_message(format!("Crawling... {} URLs processed", count));
        self.bar.tick();
    }
}

#[async_trait]
impl CrawlObserver for SpinnerObserver {
    async fn crawled(&self, _crawl_url: &CrawlUrl, _page: &PageResponse) -> anyhow::Result<()> {
        self.tick();
        Ok(())
    }

    async fn failed(&self, _crawl_url: &CrawlUrl, _error: &CrawlError) -> anyhow::Result<()> {
        self.tick();
        Ok(())
    }
}

/// Execute a crawl with the given options
/// Returns one record per crawled or failed page
pub async fn execute_crawl(options: CrawlOptions) -> anyhow::Result<Vec<CrawlRecord>> {
    let CrawlOptions {
        urls,
        concurrency,
        max_depth,
        max_pages,
        delay,
        max_response_bytes,
        include_subdomains,
        respect_robots,
        user_agent,
        timeout_secs,
        show_progress_bars,
        store_path,
    } = options;

    let collector = Arc::new(CollectingObserver::default());
    let processed_count = Arc::new(AtomicUsize::new(0));

    let progress_bar = if show_progress_bars {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        bar.set_message("Starting crawl...");
        Some(bar)
    } else {
        None
    };

    let scope = if include_subdomains {
        CrawlScope::SubdomainInclusive
    } else {
        CrawlScope::SingleHost
    };

    let mut crawler = Crawler::new()
        .with_scope(scope)
        .with_concurrency(concurrency)
        .with_delay_between_requests(delay)
        .with_maximum_response_size(max_response_bytes)
        .with_timeout(timeout_secs)
        .add_observer(collector.clone());

    if let Some(depth) = max_depth {
        crawler = crawler.with_maximum_depth(depth);
    }
    if let Some(pages) = max_pages {
        crawler = crawler.with_maximum_crawl_count(pages);
    }
    if let Some(agent) = user_agent {
        crawler = crawler.with_user_agent(agent);
    }
    if !respect_robots {
        crawler = crawler.ignore_robots();
    }
    if let Some(path) = store_path {
        crawler = crawler.with_store(Box::new(SqliteStore::open(&path)?));
    }
    if let Some(ref bar) = progress_bar {
        crawler = crawler.add_observer(Arc::new(SpinnerObserver {
            bar: bar.clone(),
            processed: processed_count.clone(),
        }));
    }

    for (idx, url) in urls.iter().enumerate() {
        if let Some(ref bar) = progress_bar
            && urls.len() > 1
        {
            bar.set_message(format!("Crawling host {}/{}: {}", idx + 1, urls.len(), url));
        }

        if let Err(error) = crawler.crawl(url).await {
            warn!("Failed to crawl {}: {}", url, error);
            if let Some(ref bar) = progress_bar {
                bar.println(format!("[!]  Failed to crawl {}: {}", url, error));
            }
        }
    }

    if let Some(ref bar) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        bar.finish_with_message(format!("Crawl complete! {} URLs processed", total));
    }

    Ok(collector.take())
}
