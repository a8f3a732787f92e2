// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the CLI structure is written as Rust structs and
// enums, and clap generates the parsing, --help and --version for us.
//
// Every tuning flag can also come from an environment variable
// (SCRIPT_SCOUT_THREADS, SCRIPT_SCOUT_TOP, ...), handy in CI.
// =============================================================================

use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::config::CrawlConfig;

#[derive(Parser, Debug)]
#[command(
    name = "script-scout",
    version,
    about = "Find the most used JavaScript libraries on the sites a search query returns",
    long_about = "script-scout fetches the search results for a query, downloads every result site \
                  concurrently and ranks the JavaScript files referenced by their <script> tags."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank the JavaScript libraries used by the search results for a query
    ///
    /// Example: script-scout top "java tutorial" --threads 8
    Top {
        /// Free-text search query
        query: String,

        /// Number of pages downloaded at the same time
        #[arg(short, long, env = "SCRIPT_SCOUT_THREADS", default_value_t = 4)]
        threads: usize,

        #[command(flatten)]
        tuning: Tuning,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List the JavaScript libraries referenced by one or more pages
    ///
    /// Example: script-scout scan https://www.java.com/
    Scan {
        /// Page URLs to scan
        #[arg(required = true)]
        urls: Vec<String>,

        #[command(flatten)]
        tuning: Tuning,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Crawl settings shared by both subcommands
#[derive(clap::Args, Debug, Clone)]
pub struct Tuning {
    /// How many libraries to report
    #[arg(long, env = "SCRIPT_SCOUT_TOP", default_value_t = 5)]
    pub top: usize,

    /// How many results to request from the search engine
    #[arg(long, env = "SCRIPT_SCOUT_RESULTS", default_value_t = 20)]
    pub results: usize,

    /// Timeout of a single page download, in seconds
    #[arg(long, env = "SCRIPT_SCOUT_FETCH_TIMEOUT", default_value_t = 20)]
    pub fetch_timeout: u64,

    /// How long to wait for all downloads before reporting, in seconds
    #[arg(long, env = "SCRIPT_SCOUT_AWAIT_TIMEOUT", default_value_t = 60)]
    pub await_timeout: u64,

    /// Largest page body to download, in kilobytes
    #[arg(long, env = "SCRIPT_SCOUT_MAX_PAGE_KB", default_value_t = 5120)]
    pub max_page_kb: usize,
}

impl Tuning {
    pub fn to_config(&self) -> CrawlConfig {
        CrawlConfig {
            top: self.top,
            results_per_page: self.results,
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
            await_timeout: Duration::from_secs(self.await_timeout),
            max_page_bytes: self.max_page_kb.saturating_mul(1024),
            ..CrawlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_top_defaults() {
        let cli = Cli::try_parse_from(["script-scout", "top", "java"]).unwrap();
        match cli.command {
            Commands::Top { query, threads, tuning, json } => {
                assert_eq!(query, "java");
                assert_eq!(threads, 4);
                assert!(!json);
                let config = tuning.to_config();
                assert_eq!(config.top, 5);
                assert_eq!(config.await_timeout, Duration::from_secs(60));
                assert_eq!(config.max_page_bytes, CrawlConfig::default().max_page_bytes);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_scan_requires_url() {
        assert!(Cli::try_parse_from(["script-scout", "scan"]).is_err());
        let cli = Cli::try_parse_from([
            "script-scout",
            "scan",
            "https://a.com",
            "https://b.com",
            "--json",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Scan { ref urls, json: true, .. } if urls.len() == 2
        ));
    }
}
