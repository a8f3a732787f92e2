// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (stderr) and parse command-line arguments
// 2. Build the HTTP fetcher, the search source and the crawler
// 3. Run the requested subcommand and print its results
// 4. Exit with a proper code (0 = success, 1 = search unavailable, 2 = error)
// =============================================================================

mod cli;
mod config;
mod crawl;
mod error;
mod fetch;
mod scan;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

use cli::{Cli, Commands, Tuning};
use crawl::{Completion, CrawlReport, Crawler, PageScan};
use fetch::{GoogleSearch, HttpFetcher, PageFetcher};

// Pages fetched at once by the scan subcommand
const SCAN_CONCURRENCY: usize = 8;

#[tokio::main]
async fn main() {
    telemetry::init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Top {
            query,
            threads,
            tuning,
            json,
        } => handle_top(&query, threads, &tuning, json).await,
        Commands::Scan { urls, tuning, json } => handle_scan(urls, &tuning, json).await,
    }
}

fn build_crawler(tuning: &Tuning) -> Result<Crawler> {
    let config = tuning.to_config();
    let fetcher: Arc<dyn PageFetcher> =
        Arc::new(HttpFetcher::new(config.max_page_bytes).context("failed to create HTTP client")?);
    let search = GoogleSearch::new(
        Arc::clone(&fetcher),
        config.search_user_agent.clone(),
        config.fetch_timeout,
        config.results_per_page,
    );

    Ok(Crawler::new(Arc::new(search), fetcher, config))
}

// Handles the 'top' subcommand
async fn handle_top(query: &str, threads: usize, tuning: &Tuning, json: bool) -> Result<i32> {
    let crawler = build_crawler(tuning)?;
    let report = crawler.crawl(query, threads).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.search_error.is_some() {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Handles the 'scan' subcommand
async fn handle_scan(urls: Vec<String>, tuning: &Tuning, json: bool) -> Result<i32> {
    let crawler = build_crawler(tuning)?;

    // Keep the input order in the output: buffered(), not buffer_unordered()
    let scans: Vec<PageScan> = stream::iter(urls)
        .map(|url| {
            let crawler = &crawler;
            async move { crawler.scan_page(&url).await }
        })
        .buffered(SCAN_CONCURRENCY)
        .collect()
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&scans)?);
    } else {
        for scan in &scans {
            print_scan(scan);
        }
    }

    Ok(0)
}

fn print_report(report: &CrawlReport) {
    if let Some(reason) = &report.search_error {
        println!("⚠️  Search results unavailable: {}", reason);
        return;
    }

    println!("🔍 Query: {}", report.query);
    println!("📄 Sites crawled: {}", report.pages_dispatched);
    if report.completion == Completion::TimedOut {
        println!("⏱️  Some sites did not answer in time, results are partial");
    }
    println!();

    if report.ranking.is_empty() {
        println!("No JavaScript libraries found");
        return;
    }

    println!("{:<6} {:<50} {:>8}", "RANK", "LIBRARY", "PAGES");
    println!("{}", "=".repeat(66));
    for (rank, entry) in report.ranking.iter().enumerate() {
        println!("{:<6} {:<50} {:>8}", rank + 1, truncate(&entry.name, 50), entry.count);
    }
}

fn print_scan(scan: &PageScan) {
    match &scan.error {
        Some(reason) => println!("❌ {} ({})", scan.url, reason),
        None => {
            println!("📄 {} ({} scripts)", scan.url, scan.libraries.len());
            for name in &scan.libraries {
                println!("   {}", name);
            }
        }
    }
}

// Shortens long names for the table, on a char boundary
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("odc.js", 50), "odc.js");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
