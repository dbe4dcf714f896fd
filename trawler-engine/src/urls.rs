use url::Url;

/// Schemes the crawler is willing to fetch.
const CRAWLABLE_SCHEMES: [&str; 2] = ["http", "https"];

pub fn has_crawlable_scheme(url: &Url) -> bool {
    CRAWLABLE_SCHEMES.contains(&url.scheme())
}

/// Normalize a URL to its identity form: fragment stripped, scheme limited
/// to plain http(s). Returns `None` for anything the crawler cannot fetch.
pub fn normalize(url: &Url) -> Option<Url> {
    if !has_crawlable_scheme(url) {
        return None;
    }

    let mut normalized = url.clone();
    normalized.set_fragment(None);
    Some(normalized)
}

/// Parse and normalize a raw candidate in one step.
pub fn parse_and_normalize(raw: &str) -> Option<Url> {
    Url::parse(raw).ok().and_then(|url| normalize(&url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_fragment() {
        let url = Url::parse("https://example.com/about#team").unwrap();
        let normalized = normalize(&url).unwrap();
        assert_eq!(normalized.as_str(), "https://example.com/about");
    }

    #[test]
    fn test_normalize_keeps_query() {
        let url = Url::parse("https://example.com/search?q=rust#results").unwrap();
        let normalized = normalize(&url).unwrap();
        assert_eq!(normalized.as_str(), "https://example.com/search?q=rust");
    }

    #[test]
    fn test_normalize_rejects_non_http_schemes() {
        for raw in [
            "mailto:someone@example.com",
            "javascript:void(0)",
            "ftp://example.com/file.txt",
            "tel:+15551234567",
        ] {
            assert!(parse_and_normalize(raw).is_none(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_normalize_accepts_http_and_https() {
        assert!(parse_and_normalize("http://example.com/").is_some());
        assert!(parse_and_normalize("https://example.com/").is_some());
    }

    #[test]
    fn test_parse_and_normalize_rejects_garbage() {
        assert!(parse_and_normalize("not a url at all").is_none());
    }

    #[test]
    fn test_identical_after_fragment_strip() {
        let a = parse_and_normalize("https://example.com/about").unwrap();
        let b = parse_and_normalize("https://example.com/about#team").unwrap();
        assert_eq!(a, b);
    }
}
