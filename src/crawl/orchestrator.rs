// src/crawl/orchestrator.rs
// =============================================================================
// Runs one crawl from a search query to the top JavaScript libraries.
//
// How it works:
// 1. Check the input (non-empty query, at least one worker)
// 2. Fetch the search result page and collect its anchors
// 3. Validate each anchor; every new canonical domain becomes one task
// 4. Wait for the workers (bounded by the await timeout)
// 5. Rank the libraries the workers counted
//
// Each worker downloads one site, extracts its script names and increments
// the shared LibraryTally. A worker whose page fails to download just logs
// the failure; it never affects the other workers or the crawl.
//
// Nothing here outlives a call to crawl(): the dispatcher, the tally and the
// visited set are all created fresh and dropped at the end.
// =============================================================================

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::dispatcher::{Completion, Dispatcher};
use super::tally::{ranked, top_k, LibraryCount, LibraryTally};
use crate::config::CrawlConfig;
use crate::error::{CrawlError, FetchError};
use crate::fetch::{PageFetcher, SearchSource};
use crate::scan::{self, CanonicalDomain};

/// What one crawl produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    pub query: String,
    /// Library names, most frequent first
    #[serde(rename = "topJSLibraries")]
    pub top_libraries: Vec<String>,
    /// Same order as top_libraries, with the counts
    pub ranking: Vec<LibraryCount>,
    /// Number of distinct sites handed to the workers
    pub pages_dispatched: usize,
    pub completion: Completion,
    /// Set when the search page itself could not be fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_error: Option<String>,
}

impl CrawlReport {
    fn search_failed(query: &str, error: &FetchError) -> Self {
        Self {
            query: query.to_string(),
            top_libraries: Vec::new(),
            ranking: Vec::new(),
            pages_dispatched: 0,
            completion: Completion::Completed,
            search_error: Some(error.to_string()),
        }
    }
}

/// Libraries found on a single page (the `scan` subcommand).
#[derive(Debug, Clone, Serialize)]
pub struct PageScan {
    pub url: String,
    pub libraries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct Crawler {
    search: Arc<dyn SearchSource>,
    fetcher: Arc<dyn PageFetcher>,
    config: CrawlConfig,
}

impl Crawler {
    pub fn new(
        search: Arc<dyn SearchSource>,
        fetcher: Arc<dyn PageFetcher>,
        config: CrawlConfig,
    ) -> Self {
        Self {
            search,
            fetcher,
            config,
        }
    }

    // Crawls the sites a search query returns and ranks their libraries
    //
    // Returns:
    //   Err(CrawlError) - invalid input, nothing was started
    //   Ok(report)      - everything else, including an unreachable search
    //                     page (report.search_error) and a timed-out wait
    //                     (report.completion == TimedOut, partial counts)
    pub async fn crawl(&self, query: &str, concurrency: usize) -> Result<CrawlReport, CrawlError> {
        // Reject bad input before any network call or task exists
        let query = query.trim();
        if query.is_empty() {
            return Err(CrawlError::EmptyQuery);
        }
        if concurrency == 0 {
            return Err(CrawlError::InvalidConcurrency(concurrency));
        }

        info!(query, concurrency, "starting crawl");

        // Get the raw anchors of the result page
        // An unreachable search page ends the crawl with an empty report
        let links = match self.search.search(query).await {
            Ok(links) => links,
            Err(e) => {
                error!(query, "could not fetch search results: {}", e);
                return Ok(CrawlReport::search_failed(query, &e));
            }
        };

        // Fresh tally and pool for this crawl only
        let tally = Arc::new(LibraryTally::new());
        let mut dispatcher = Dispatcher::start(concurrency)?;
        let visited = self.dispatch_links(&links, &mut dispatcher, &tally);

        // Wait for the workers; on timeout we keep what was counted so far
        let completion = dispatcher
            .await_all_complete(self.config.await_timeout)
            .await;
        dispatcher.stop();

        // After the barrier (or the best-effort cut-off) nobody else writes
        if tally.is_empty() {
            debug!("no libraries found on any crawled page");
        }
        // Copy the counts once and rank them
        let table = tally.snapshot();
        let top_libraries = top_k(&table, self.config.top);
        let ranking = ranked(&table, self.config.top);

        info!(
            pages = visited.len(),
            libraries = tally.len(),
            ?completion,
            "crawl finished"
        );

        Ok(CrawlReport {
            query: query.to_string(),
            top_libraries,
            ranking,
            pages_dispatched: visited.len(),
            completion,
            search_error: None,
        })
    }

    // Validates and dedupes the result links, submitting one task per site.
    // Returns the visited set; its size is the number of submitted tasks.
    fn dispatch_links(
        &self,
        links: &[String],
        dispatcher: &mut Dispatcher,
        tally: &Arc<LibraryTally>,
    ) -> HashSet<CanonicalDomain> {
        let mut visited = HashSet::new();

        for href in links {
            // Skip navigation links and anything without a domain
            let Some(domain) = scan::validate(href) else {
                continue;
            };

            // Skip sites we already handed to a worker
            if visited.contains(&domain) {
                continue;
            }

            // Prefer the real destination, fall back to https://www.<domain>/
            let url = scan::destination_url(href).unwrap_or_else(|| domain.root_url());
            debug!(%domain, %url, "dispatching page");
            visited.insert(domain);

            // Everything the worker needs is moved into its future
            let fetcher = Arc::clone(&self.fetcher);
            let tally = Arc::clone(tally);
            let user_agent = self.config.page_user_agent.clone();
            let timeout = self.config.fetch_timeout;

            dispatcher.submit(async move {
                match fetcher.fetch_page(&url, &user_agent, timeout).await {
                    // One increment per script tag found on the page
                    Ok(html) => {
                        let libraries = scan::extract_libraries(&html);
                        debug!(%url, count = libraries.len(), "page scanned");
                        for name in &libraries {
                            tally.increment(name);
                        }
                    }
                    // A failed page counts as "no libraries", nothing more
                    Err(e) => warn!(%url, "failed to fetch page: {}", e),
                }
            });
        }

        visited
    }

    /// Fetches one page and lists its libraries without touching a tally.
    pub async fn scan_page(&self, url: &str) -> PageScan {
        let fetched = self
            .fetcher
            .fetch_page(url, &self.config.page_user_agent, self.config.fetch_timeout)
            .await;

        match fetched {
            Ok(html) => PageScan {
                url: url.to_string(),
                libraries: scan::extract_libraries(&html),
                error: None,
            },
            Err(e) => {
                warn!(url, "failed to fetch page: {}", e);
                PageScan {
                    url: url.to_string(),
                    libraries: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is the visited set a plain HashSet?
//    - Only dispatch_links() touches it, on the crawl's own task
//    - Workers never see it, so it needs no lock and no Arc
//
// 2. Why Arc<LibraryTally>?
//    - Every worker future is 'static and may run on another thread
//    - Arc gives each of them shared ownership of the same tally
//    - The tally itself does the synchronization (see crawl/tally.rs)
//
// 3. Why is a search failure Ok(report) and not Err?
//    - The request was valid; the network just didn't cooperate
//    - Callers get an empty ranking plus search_error to explain it
// -----------------------------------------------------------------------------
