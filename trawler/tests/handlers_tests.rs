use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use trawler::handlers::*;
use trawler::{extract_url_path, generate_crawl_report};
use url::Url;

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    let result = parse_url_line("example.com");
    assert_eq!(result, Some("http://example.com".to_string()));
}

#[test]
fn test_parse_url_line_invalid() {
    let result = parse_url_line("not a valid url!!!");
    assert_eq!(result, None);
}

#[test]
fn test_extract_url_path() {
    assert_eq!(
        extract_url_path("https://example.com/docs/intro"),
        "/docs/intro"
    );
    assert_eq!(extract_url_path("https://example.com/"), "/");
    assert_eq!(extract_url_path("https://example.com"), "/");
}

#[test]
fn test_load_urls_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://example.com")?;
    writeln!(temp_file, "httpbin.org")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "https://blog.example.com")?;

    let urls = load_urls_from_file(temp_file.path())?;

    assert_eq!(urls.len(), 3);
    assert_eq!(urls[0], "https://example.com");
    assert_eq!(urls[1], "http://httpbin.org");
    assert_eq!(urls[2], "https://blog.example.com");

    Ok(())
}

#[test]
fn test_load_urls_from_file_empty() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();

    let result = load_urls_from_file(temp_file.path());

    assert!(result.is_err());
    assert!(result.unwrap_err().contains("No valid URLs"));
}

#[test]
fn test_load_urls_from_file_missing() {
    let result = load_urls_from_file(&PathBuf::from("/nonexistent/hosts.txt"));
    assert!(result.is_err());
}

#[test]
fn test_load_urls_from_source_single_url() {
    let url = Url::parse("https://example.com").unwrap();
    let result = load_urls_from_source(Some(&url), None).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0], "https://example.com/");
}

#[test]
fn test_load_urls_from_source_no_input() {
    let result = load_urls_from_source(None, None);
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .contains("Either --url or --hosts-file must be provided")
    );
}

#[test]
fn test_generate_crawl_report() {
    use std::time::Duration;
    use trawler_engine::CrawlRecord;

    let records = vec![
        CrawlRecord {
            url: "https://example.com/".to_string(),
            final_url: "https://example.com/".to_string(),
            status_code: 200,
            content_type: Some("text/html".to_string()),
            found_on: None,
            body_bytes: 1024,
            response_time: Duration::from_millis(100),
            error: None,
        },
        CrawlRecord {
            url: "https://example.com/feed.json".to_string(),
            final_url: "https://example.com/feed.json".to_string(),
            status_code: 200,
            content_type: Some("application/json".to_string()),
            found_on: Some("https://example.com/".to_string()),
            body_bytes: 512,
            response_time: Duration::from_millis(50),
            error: None,
        },
    ];

    let report = generate_crawl_report(&records);

    assert!(report.contains("Pages crawled: 2"));
    assert!(report.contains("Bytes captured: 1536"));
    assert!(report.contains("example.com"));
    assert!(report.contains("/feed.json"));
    assert!(report.contains("application/json"));
    assert!(!report.contains("text/html")); // Should be hidden
}
