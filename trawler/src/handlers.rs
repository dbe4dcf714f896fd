use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use trawler_core::{CrawlOptions, execute_crawl, generate_crawl_report, records_to_json};
use url::Url;

// Helper functions for the crawl handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    // Try to parse as-is
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    // Try adding http://
    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    None
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let urls = match load_urls_from_source(url, hosts_file) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("{} {}", "[!]".red(), e);
            std::process::exit(1);
        }
    };

    let threads = *sub_matches.get_one::<usize>("threads").unwrap();
    let max_depth = sub_matches.get_one::<usize>("depth").copied();
    let max_pages = sub_matches.get_one::<usize>("max-pages").copied();
    let delay_ms = *sub_matches.get_one::<u64>("delay-ms").unwrap();
    let max_body_bytes = *sub_matches.get_one::<usize>("max-body-bytes").unwrap();
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap();
    let include_subdomains = sub_matches.get_flag("subdomains");
    let ignore_robots = sub_matches.get_flag("ignore-robots");
    let user_agent = sub_matches.get_one::<String>("user-agent").cloned();
    let store_path = sub_matches
        .get_one::<String>("store")
        .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()));
    let json_path = sub_matches
        .get_one::<String>("json")
        .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()));

    // Print crawl configuration
    if !quiet {
        println!("Crawling {} host(s)", urls.len());
        println!("Workers: {}", threads);
        match max_depth {
            Some(depth) => println!("Max depth: {}", depth),
            None => println!("Max depth: unbounded"),
        }
        let scope = if include_subdomains {
            "seed host and subdomains"
        } else {
            "seed host only"
        };
        println!("Scope: {}", scope);
        println!(
            "Robots: {}\n",
            if ignore_robots { "ignored" } else { "respected" }
        );
    }

    let options = CrawlOptions {
        urls,
        concurrency: threads,
        max_depth,
        max_pages,
        delay: Duration::from_millis(delay_ms),
        max_response_bytes: max_body_bytes,
        include_subdomains,
        respect_robots: !ignore_robots,
        user_agent,
        timeout_secs,
        show_progress_bars: !quiet,
        store_path,
    };

    let records = match execute_crawl(options).await {
        Ok(records) => records,
        Err(e) => {
            eprintln!("{} Crawl failed: {}", "[!]".red(), e);
            std::process::exit(1);
        }
    };

    if !quiet {
        println!("\n{} Crawl complete!\n", "[ok]".green());
    }

    if let Some(path) = json_path {
        match records_to_json(&records) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    eprintln!("{} Failed to write {}: {}", "[!]".red(), path.display(), e);
                } else if !quiet {
                    println!("Records written to {}\n", path.display());
                }
            }
            Err(e) => eprintln!("{} Failed to serialize records: {}", "[!]".red(), e),
        }
    }

    // Generate and display report
    let report = generate_crawl_report(&records);
    print!("{}", report);
}
