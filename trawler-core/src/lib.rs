pub mod crawl;
pub mod report;
pub mod store;

pub use crawl::{CrawlOptions, execute_crawl};
pub use report::{extract_url_path, generate_crawl_report, records_to_json};
pub use store::SqliteStore;

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
 _                        _
| |_ _ __ __ ___      __ | |  ___  _ __
| __| '__/ _` \ \ /\ / / | | / _ \| '__|
| |_| | | (_| |\ V  V /  | ||  __/| |
 \__|_|  \__,_| \_/\_/   |_| \___||_|
"#;
    println!("{}", banner.cyan());
    println!(
        "  {} v{} - a polite concurrent website crawler\n",
        "trawler".bold(),
        env!("CARGO_PKG_VERSION")
    );
}
