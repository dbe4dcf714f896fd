use crate::error::Result;
use crate::queue::Frontier;
use crate::robots::RobotsTxt;
use crate::session::CrawlSession;
use crate::store::NodeRecord;
use crate::urls;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Scans a fetched body for outbound candidates and feeds the survivors
/// back into the frontier. Runs inline with the parent page's processing:
/// the tree and queue are order-sensitive shared structures, so extraction
/// is serialized at the admission boundary and throughput comes from
/// concurrent fetches instead.
pub struct LinkAdder<'a> {
    session: &'a CrawlSession,
    frontier: &'a Frontier,
    robots: Option<&'a RobotsTxt>,
}

impl<'a> LinkAdder<'a> {
    pub fn new(
        session: &'a CrawlSession,
        frontier: &'a Frontier,
        robots: Option<&'a RobotsTxt>,
    ) -> Self {
        Self {
            session,
            frontier,
            robots,
        }
    }

    /// Extract candidates from `html`, admit each into the depth tree and
    /// queue the ones that survive eligibility. Returns how many were
    /// queued. The scan always runs to completion, even once the page
    /// ceiling stops further enqueues.
    pub async fn add_from_html(&self, html: &str, found_on: &Url) -> Result<usize> {
        let mut queued = 0;

        for candidate in extract_candidates(html, found_on) {
            let Some(url) = urls::normalize(&candidate) else {
                continue;
            };

            let Some(report) = self.frontier.admit(&url, found_on).await? else {
                continue;
            };
            if !report.newly_discovered || !self.is_eligible(&report.node) {
                continue;
            }

            if url.path().contains("/tel:") {
                continue;
            }

            if self
                .frontier
                .enqueue(&url, found_on, self.session.maximum_crawl_count)
                .await?
                .is_some()
            {
                queued += 1;
            }
        }

        debug!("queued {} new urls from {}", queued, found_on);
        Ok(queued)
    }

    /// Whether an admitted node may be queued for fetching. An ineligible
    /// URL stays in the tree for dedup but never reaches the frontier.
    fn is_eligible(&self, node: &NodeRecord) -> bool {
        if self.session.respect_robots
            && let Some(robots) = self.robots
            && !robots.allows(&node.url, &self.session.user_agent)
        {
            return false;
        }

        match self.session.maximum_depth {
            Some(maximum) => node.depth <= maximum,
            None => true,
        }
    }
}

/// Candidate URIs in document order: inline-style background images,
/// image sources, anchors and pagination links.
fn extract_candidates(html: &str, found_on: &Url) -> Vec<Url> {
    // Uniform quote style so background urls parse the same way.
    let html = html.replace("url(\"", "url('");
    let document = Html::parse_document(&html);
    let mut candidates = Vec::new();

    let styled = Selector::parse("div[style]").unwrap();
    for element in document.select(&styled) {
        if let Some(style) = element.value().attr("style")
            && let Some(raw) = between(style, "url('", "')")
            && let Ok(url) = found_on.join(raw)
        {
            candidates.push(url);
        }
    }

    let images = Selector::parse("img[src]").unwrap();
    for element in document.select(&images) {
        if let Some(src) = element.value().attr("src")
            && let Ok(url) = found_on.join(src)
        {
            candidates.push(url);
        }
    }

    let links = Selector::parse(r#"a[href], link[rel="next"][href], link[rel="prev"][href]"#)
        .unwrap();
    for element in document.select(&links) {
        if is_decorative_anchor(&element) {
            continue;
        }
        if element.value().attr("rel") == Some("nofollow") {
            continue;
        }
        if let Some(href) = element.value().attr("href")
            && let Ok(url) = found_on.join(href)
        {
            candidates.push(url);
        }
    }

    candidates
}

/// An anchor with no child nodes and no following sibling is decorative
/// markup, not a link.
fn is_decorative_anchor(element: &ElementRef) -> bool {
    element.value().name() == "a"
        && element.first_child().is_none()
        && element.next_sibling().is_none()
}

fn between<'s>(haystack: &'s str, start: &str, end: &str) -> Option<&'s str> {
    let from = haystack.find(start)? + start.len();
    let len = haystack[from..].find(end)?;
    Some(&haystack[from..from + len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CrawlScope, CrawlSession, DEFAULT_USER_AGENT};
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    fn session(base: &str) -> CrawlSession {
        CrawlSession {
            base_url: url(base),
            scope: CrawlScope::SingleHost,
            maximum_depth: None,
            maximum_crawl_count: None,
            delay_between_requests: Duration::ZERO,
            maximum_response_size: 2 * 1024 * 1024,
            parseable_mime_types: Vec::new(),
            respect_robots: true,
            concurrency: 1,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            execute_javascript: false,
        }
    }

    async fn seeded_frontier(base: &str) -> Frontier {
        let frontier = Frontier::new(Box::new(MemoryStore::new()));
        frontier.seed(&url(base)).await.unwrap();
        frontier
    }

    #[tokio::test]
    async fn test_fragment_dedup_and_nofollow() {
        let session = session("https://example.com/");
        let frontier = seeded_frontier("https://example.com/").await;
        let adder = LinkAdder::new(&session, &frontier, None);

        let html = r#"<html><body>
            <a href="/about">About</a>
            <a href="/about#team">Team</a>
            <a rel="nofollow" href="/secret">Secret</a>
        </body></html>"#;

        let queued = adder
            .add_from_html(html, &url("https://example.com/"))
            .await
            .unwrap();

        assert_eq!(queued, 1);
        assert!(
            frontier
                .node_by_url(&url("https://example.com/about"))
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            frontier
                .node_by_url(&url("https://example.com/secret"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_decorative_anchor_is_skipped() {
        let session = session("https://example.com/");
        let frontier = seeded_frontier("https://example.com/").await;
        let adder = LinkAdder::new(&session, &frontier, None);

        // First anchor is empty and last inside its parent: decorative.
        // Second is empty but has a following sibling, so it counts.
        let html = r#"<html><body>
            <p><a href="/decorative"></a></p>
            <p><a href="/kept"></a><span>caption</span></p>
        </body></html>"#;

        adder
            .add_from_html(html, &url("https://example.com/"))
            .await
            .unwrap();

        assert!(
            frontier
                .node_by_url(&url("https://example.com/decorative"))
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            frontier
                .node_by_url(&url("https://example.com/kept"))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_background_image_and_img_sources() {
        let session = session("https://example.com/");
        let frontier = seeded_frontier("https://example.com/").await;
        let adder = LinkAdder::new(&session, &frontier, None);

        let html = r#"<html><body>
            <div style="background-image: url('/img/hero.png');">x</div>
            <div style="background: url('https://example.com/img/banner.jpg')">y</div>
            <img src="logo.svg">
        </body></html>"#;

        let queued = adder
            .add_from_html(html, &url("https://example.com/"))
            .await
            .unwrap();

        assert_eq!(queued, 3);
        assert!(
            frontier
                .node_by_url(&url("https://example.com/img/hero.png"))
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            frontier
                .node_by_url(&url("https://example.com/logo.svg"))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_pagination_links_followed() {
        let session = session("https://example.com/");
        let frontier = seeded_frontier("https://example.com/").await;
        let adder = LinkAdder::new(&session, &frontier, None);

        let html = r#"<html><head>
            <link rel="next" href="/page/2">
            <link rel="stylesheet" href="/style.css">
        </head></html>"#;

        let queued = adder
            .add_from_html(html, &url("https://example.com/"))
            .await
            .unwrap();

        assert_eq!(queued, 1);
        assert!(
            frontier
                .node_by_url(&url("https://example.com/style.css"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_telephone_paths_admitted_but_never_queued() {
        let session = session("https://example.com/");
        let frontier = seeded_frontier("https://example.com/").await;
        let adder = LinkAdder::new(&session, &frontier, None);

        let html = r#"<a href="/tel:+15551234567">call us</a><span>.</span>"#;
        let queued = adder
            .add_from_html(html, &url("https://example.com/"))
            .await
            .unwrap();

        assert_eq!(queued, 0);
        // Recorded in the tree so it can never be re-admitted.
        assert!(
            frontier
                .node_by_url(&url("https://example.com/tel:+15551234567"))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_maximum_depth_blocks_enqueue_but_not_admission() {
        let mut session = session("https://example.com/");
        session.maximum_depth = Some(1);
        let frontier = seeded_frontier("https://example.com/").await;
        let adder = LinkAdder::new(&session, &frontier, None);

        adder
            .add_from_html(
                r#"<a href="/level1">a</a><span>.</span>"#,
                &url("https://example.com/"),
            )
            .await
            .unwrap();
        let queued = adder
            .add_from_html(
                r#"<a href="/level2">b</a><span>.</span>"#,
                &url("https://example.com/level1"),
            )
            .await
            .unwrap();

        assert_eq!(queued, 0);
        let node = frontier
            .node_by_url(&url("https://example.com/level2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(node.depth, 2);
        assert_eq!(frontier.queued_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_robots_disallowed_paths_never_queued() {
        let session = session("https://example.com/");
        let frontier = seeded_frontier("https://example.com/").await;
        let robots = RobotsTxt::parse("User-agent: *\nDisallow: /admin/\n");
        let adder = LinkAdder::new(&session, &frontier, Some(&robots));

        let html = r#"<a href="/admin/panel">admin</a><a href="/public">pub</a><span>.</span>"#;
        let queued = adder
            .add_from_html(html, &url("https://example.com/"))
            .await
            .unwrap();

        assert_eq!(queued, 1);
        assert!(
            frontier
                .node_by_url(&url("https://example.com/admin/panel"))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_ceiling_drops_silently_but_scan_completes() {
        let mut session = session("https://example.com/");
        session.maximum_crawl_count = Some(2);
        let frontier = seeded_frontier("https://example.com/").await;
        let adder = LinkAdder::new(&session, &frontier, None);

        let html = r#"<a href="/a">a</a><a href="/b">b</a><a href="/c">c</a><span>.</span>"#;
        let queued = adder
            .add_from_html(html, &url("https://example.com/"))
            .await
            .unwrap();

        // Seed already occupies one slot.
        assert_eq!(queued, 1);
        assert_eq!(frontier.queued_count().await.unwrap(), 2);
        // Every candidate was still admitted to the tree.
        assert_eq!(frontier.node_count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_malformed_and_foreign_scheme_candidates_dropped() {
        let session = session("https://example.com/");
        let frontier = seeded_frontier("https://example.com/").await;
        let adder = LinkAdder::new(&session, &frontier, None);

        let html = r#"
            <a href="mailto:x@example.com">mail</a>
            <a href="javascript:void(0)">js</a>
            <a href="http://[broken">broken</a>
            <span>.</span>
        "#;
        let queued = adder
            .add_from_html(html, &url("https://example.com/"))
            .await
            .unwrap();

        assert_eq!(queued, 0);
        assert_eq!(frontier.node_count().await.unwrap(), 1);
    }
}
