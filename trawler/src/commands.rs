use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("trawler")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("trawler")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a site from a seed URL, or a collection of seeds, and report every \
                page found.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The seed URL to crawl")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed URLs to crawl")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the fetch pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link depth below the seed (unbounded when omitted)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-m --"max-pages" <COUNT>)
                        .required(false)
                        .help("Stop after this many pages have been processed")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"delay-ms" <MILLIS>)
                        .required(false)
                        .help("Delay between requests per worker, in milliseconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("0"),
                )
                .arg(
                    arg!(--"max-body-bytes" <BYTES>)
                        .required(false)
                        .help("Cap on captured response body size")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("2097152"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"subdomains")
                        .required(false)
                        .help("Also follow links on subdomains of the seed host")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"ignore-robots")
                        .required(false)
                        .help("Do not fetch robots.txt or honor robots directives")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"user-agent" <AGENT>)
                        .required(false)
                        .help("Override the crawler user agent"),
                )
                .arg(
                    arg!(--"store" <PATH>)
                        .required(false)
                        .help("Persist the frontier and depth tree to a SQLite database"),
                )
                .arg(
                    arg!(--"json" <PATH>)
                        .required(false)
                        .help("Write per-page records to a JSON file"),
                ),
        )
}
