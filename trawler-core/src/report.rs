use std::collections::HashMap;
use trawler_engine::CrawlRecord;
use url::Url;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Generate a crawl report from collected records
pub fn generate_crawl_report(records: &[CrawlRecord]) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");

    let crawled: Vec<&CrawlRecord> = records.iter().filter(|r| r.error.is_none()).collect();
    let failed_count = records.len() - crawled.len();
    report.push_str(&format!("  Pages crawled: {}\n", crawled.len()));
    report.push_str(&format!("  Failed fetches: {}\n", failed_count));

    let total_bytes: usize = crawled.iter().map(|r| r.body_bytes).sum();
    report.push_str(&format!("  Bytes captured: {}\n", total_bytes));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // Group records by host
    let mut by_host: HashMap<String, Vec<&CrawlRecord>> = HashMap::new();

    for record in records {
        if let Ok(url) = Url::parse(&record.url)
            && let Some(host) = url.host_str()
        {
            by_host.entry(host.to_string()).or_default().push(record);
        }
    }

    // Display records grouped by host
    for (host, host_records) in by_host.iter() {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} pages found\n\n", host_records.len()));

        for record in host_records {
            let path = extract_url_path(&record.url);

            // Color code based on status
            let status_str = match record.status_code {
                100..=199 => format!("\x1b[37m{}\x1b[0m", record.status_code), // White
                200..=299 => format!("\x1b[32m{}\x1b[0m", record.status_code), // Green
                300..=399 => format!("\x1b[36m{}\x1b[0m", record.status_code), // Cyan
                400..=499 => format!("\x1b[33m{}\x1b[0m", record.status_code), // Orange/Yellow
                500..=599 => format!("\x1b[31m{}\x1b[0m", record.status_code), // Red
                _ => "\x1b[31mERR\x1b[0m".to_string(),
            };

            // Build line with path and status
            let mut line = format!("  {} {}", status_str, path);

            // Only show MIME type if it's not text/html
            if let Some(ref content_type) = record.content_type
                && !content_type.starts_with("text/html")
            {
                line.push_str(&format!(" \x1b[90m{}\x1b[0m", content_type));
            }

            if let Some(ref error) = record.error {
                line.push_str(&format!(" \x1b[90m{}\x1b[0m", error));
            }

            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    report
}

/// Serialize records for machine-readable export
pub fn records_to_json(records: &[CrawlRecord]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
