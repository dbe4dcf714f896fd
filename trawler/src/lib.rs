// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{load_urls_from_file, load_urls_from_source, parse_url_line};

// Re-export crawl functionality from trawler-core
pub use trawler_core::crawl::{CrawlOptions, execute_crawl};
pub use trawler_core::report::{extract_url_path, generate_crawl_report, records_to_json};
