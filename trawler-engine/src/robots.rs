use robotstxt::DefaultMatcher;
use scraper::Html;
use tracing::debug;
use url::Url;

/// Parsed robots.txt rules for the crawl origin.
#[derive(Debug, Clone)]
pub struct RobotsTxt {
    content: String,
}

impl RobotsTxt {
    pub fn parse(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Rules that allow everything, used when robots.txt is missing or
    /// unfetchable.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Check whether a URL may be fetched by the given user agent.
    pub fn allows(&self, url: &Url, user_agent: &str) -> bool {
        if self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        let allowed = matcher.one_agent_allowed_by_robots(&self.content, user_agent, url.as_str());

        if !allowed {
            debug!("robots.txt disallows {} for {}", url, user_agent);
        }

        allowed
    }
}

/// Per-page robots directives, derived from the `X-Robots-Tag` response
/// header and `<meta name="robots">` in the captured body. Distinct from
/// the robots.txt check applied before a URL is queued.
#[derive(Debug, Clone, Copy)]
pub struct PageRobots {
    may_index: bool,
    may_follow: bool,
}

impl PageRobots {
    pub fn from_response(header: Option<&str>, body: &str, must_comply: bool) -> Self {
        if !must_comply {
            return Self {
                may_index: true,
                may_follow: true,
            };
        }

        let mut directives: Vec<String> = Vec::new();
        if let Some(value) = header {
            directives.push(value.to_ascii_lowercase());
        }
        directives.extend(meta_robots_directives(body));

        let forbids = |token: &str| {
            directives
                .iter()
                .any(|d| d.contains(token) || d.contains("none"))
        };

        Self {
            may_index: !forbids("noindex"),
            may_follow: !forbids("nofollow"),
        }
    }

    pub fn may_index(&self) -> bool {
        self.may_index
    }

    pub fn may_follow(&self) -> bool {
        self.may_follow
    }
}

fn meta_robots_directives(body: &str) -> Vec<String> {
    if body.is_empty() {
        return Vec::new();
    }

    let document = Html::parse_document(body);
    let selector = scraper::Selector::parse("meta").unwrap();

    document
        .select(&selector)
        .filter(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("robots"))
        })
        .filter_map(|element| element.value().attr("content"))
        .map(|content| content.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_robots_allow_all() {
        let rules = RobotsTxt::allow_all();
        assert!(rules.allows(&url("https://example.com/any/path"), "Trawler"));
    }

    #[test]
    fn test_robots_basic_disallow() {
        let content = "\
User-agent: *
Disallow: /admin/
Disallow: /private/

User-agent: BadBot
Disallow: /
";
        let rules = RobotsTxt::parse(content);

        assert!(rules.allows(&url("https://example.com/public/page"), "GoodBot"));
        assert!(!rules.allows(&url("https://example.com/admin/secret"), "GoodBot"));
        assert!(!rules.allows(&url("https://example.com/anything"), "BadBot"));
    }

    #[test]
    fn test_page_robots_defaults_to_allowed() {
        let robots = PageRobots::from_response(None, "<html><body>hi</body></html>", true);
        assert!(robots.may_index());
        assert!(robots.may_follow());
    }

    #[test]
    fn test_page_robots_header_noindex() {
        let robots = PageRobots::from_response(Some("noindex"), "", true);
        assert!(!robots.may_index());
        assert!(robots.may_follow());
    }

    #[test]
    fn test_page_robots_meta_nofollow() {
        let body = r#"<html><head><meta name="ROBOTS" content="NOFOLLOW"></head></html>"#;
        let robots = PageRobots::from_response(None, body, true);
        assert!(robots.may_index());
        assert!(!robots.may_follow());
    }

    #[test]
    fn test_page_robots_none_forbids_both() {
        let body = r#"<html><head><meta name="robots" content="none"></head></html>"#;
        let robots = PageRobots::from_response(None, body, true);
        assert!(!robots.may_index());
        assert!(!robots.may_follow());
    }

    #[test]
    fn test_page_robots_ignored_when_compliance_disabled() {
        let robots = PageRobots::from_response(Some("noindex, nofollow"), "", false);
        assert!(robots.may_index());
        assert!(robots.may_follow());
    }

    #[test]
    fn test_unrelated_meta_tags_are_ignored() {
        let body = r#"<html><head><meta name="description" content="noindex"></head></html>"#;
        let robots = PageRobots::from_response(None, body, true);
        assert!(robots.may_index());
    }
}
