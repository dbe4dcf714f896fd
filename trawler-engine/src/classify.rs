use crate::dispatch::CrawlContext;
use crate::extract::LinkAdder;
use crate::queue::CrawlUrl;
use crate::result::PageResponse;
use crate::robots::PageRobots;
use crate::urls;
use std::time::Instant;
use tracing::{debug, warn};

/// Classify a fetched response: capture a size-capped body, decide
/// indexability and link-followability, notify observers and feed the link
/// extractor. The inter-request delay is the dispatcher's job once this
/// returns.
pub(crate) async fn process_response(
    ctx: &CrawlContext,
    crawl_url: &CrawlUrl,
    response: reqwest::Response,
    started: Instant,
) -> crate::error::Result<()> {
    let session = &ctx.session;

    let status_code = response.status().as_u16();
    let final_url = response.url().clone();
    let redirected = final_url != crawl_url.url;
    let content_type = header_value(&response, reqwest::header::CONTENT_TYPE);
    let robots_header = header_value(&response, reqwest::header::HeaderName::from_static("x-robots-tag"));

    let mut body = if is_mime_allowed(&session.parseable_mime_types, content_type.as_deref()) {
        read_capped_body(response, session.maximum_response_size).await
    } else {
        debug!(
            "content type {:?} of {} not parseable, skipping body",
            content_type, crawl_url.url
        );
        String::new()
    };

    if session.execute_javascript
        && let Some(renderer) = &ctx.renderer
    {
        body = match renderer.render(&crawl_url.url).await {
            Ok(html) => html_escape::decode_html_entities(&html).into_owned(),
            Err(error) => {
                warn!("rendering failed for {}: {:#}", crawl_url.url, error);
                String::new()
            }
        };
    }

    let page = PageResponse {
        url: crawl_url.url.clone(),
        final_url,
        redirected,
        status_code,
        content_type,
        robots_header,
        body,
        response_time: started.elapsed(),
    };

    let directives =
        PageRobots::from_response(page.robots_header.as_deref(), &page.body, session.respect_robots);

    if directives.may_index() {
        ctx.observers.notify_crawled(crawl_url, &page).await;
    }

    if !session
        .scope
        .may_follow_links_on(&page.final_url, &session.base_url)
    {
        debug!("{} out of crawl scope, not following links", page.final_url);
        return Ok(());
    }

    if !directives.may_follow() {
        debug!("robots directives forbid following links on {}", page.final_url);
        return Ok(());
    }

    // Relative links resolve against where the content actually came from.
    let base_url = if page.redirected {
        // The redirect target joins the discovery tree as a child of the
        // page that was asked for, so its outbound links have a parent and
        // a later direct link to it is not fetched twice.
        if let Some(normalized) = urls::normalize(&page.final_url) {
            ctx.frontier.admit(&normalized, &crawl_url.url).await?;
        }
        page.final_url.clone()
    } else {
        crawl_url.url.clone()
    };

    let adder = LinkAdder::new(session, &ctx.frontier, ctx.robots.as_deref());
    adder.add_from_html(&page.body, &base_url).await?;

    Ok(())
}

fn header_value(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Substring match against the allowed set, case-insensitive. An empty set
/// or a missing header allows everything.
pub(crate) fn is_mime_allowed(allowed: &[String], content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    if allowed.is_empty() {
        return true;
    }

    let content_type = content_type.to_ascii_lowercase();
    allowed
        .iter()
        .any(|mime| content_type.contains(&mime.to_ascii_lowercase()))
}

/// Materialize the body up to `cap` bytes, chunk by chunk. A read error is
/// treated as end of data, not a failed page.
async fn read_capped_body(mut response: reqwest::Response, cap: usize) -> String {
    let mut buffer: Vec<u8> = Vec::new();

    while buffer.len() < cap {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let remaining = cap - buffer.len();
                buffer.extend_from_slice(&chunk[..chunk.len().min(remaining)]);
            }
            Ok(None) => break,
            Err(error) => {
                debug!("body read ended early: {}", error);
                break;
            }
        }
    }

    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_allow_list_allows_everything() {
        assert!(is_mime_allowed(&[], Some("application/pdf")));
        assert!(is_mime_allowed(&[], None));
    }

    #[test]
    fn test_missing_content_type_is_allowed() {
        let allowed = vec!["text/html".to_string()];
        assert!(is_mime_allowed(&allowed, None));
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let allowed = vec!["text/html".to_string()];
        assert!(is_mime_allowed(&allowed, Some("Text/HTML; charset=utf-8")));
        assert!(!is_mime_allowed(&allowed, Some("image/png")));
    }

    #[test]
    fn test_multiple_allowed_types() {
        let allowed = vec!["text/html".to_string(), "application/xhtml".to_string()];
        assert!(is_mime_allowed(&allowed, Some("application/xhtml+xml")));
    }
}
