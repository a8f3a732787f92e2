// src/config.rs
// =============================================================================
// Crawl settings.
//
// One CrawlConfig is built per invocation (from the CLI flags, which in turn
// may come from SCRIPT_SCOUT_* environment variables) and handed to the
// Crawler. Defaults are what you get with no flags at all.
// =============================================================================

use std::time::Duration;

/// User agent sent to the search engine. Google serves the plain HTML result
/// page (with /url?q= redirect links) to crawlers.
pub const SEARCH_USER_AGENT: &str =
    "Chrome/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

/// User agent sent to every crawled site.
pub const PAGE_USER_AGENT: &str = "Chrome";

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// How many library names the report keeps
    pub top: usize,
    /// How many results we ask the search engine for (its `num` parameter)
    pub results_per_page: usize,
    /// Timeout of one page (or search page) fetch
    pub fetch_timeout: Duration,
    /// How long the crawl waits for all workers before reporting what it has
    pub await_timeout: Duration,
    /// Largest page body a worker will buffer
    pub max_page_bytes: usize,
    pub search_user_agent: String,
    pub page_user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            top: 5,
            results_per_page: 20,
            fetch_timeout: Duration::from_secs(20),
            // Longer than one fetch timeout so a full fetch cycle always fits
            await_timeout: Duration::from_secs(60),
            max_page_bytes: 5 * 1024 * 1024,
            search_user_agent: SEARCH_USER_AGENT.to_string(),
            page_user_agent: PAGE_USER_AGENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_await_timeout_covers_a_fetch() {
        let config = CrawlConfig::default();
        assert!(config.await_timeout > config.fetch_timeout);
        assert_eq!(config.top, 5);
    }
}
