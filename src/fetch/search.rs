// src/fetch/search.rs
// =============================================================================
// Fetches the search-engine result page for a query and returns the raw
// anchor targets found on it.
//
// The links are returned untouched: deciding which of them are real results
// is the link validator's job (scan::link), not ours.
// =============================================================================

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::http::PageFetcher;
use crate::error::FetchError;

const GOOGLE_SEARCH_URL: &str = "https://www.google.com/search";

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("'a[href]' is a valid selector"));

/// Source of search-result links for a query.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Every `href` on the result page, in document order.
    async fn search(&self, query: &str) -> Result<Vec<String>, FetchError>;
}

/// Google's plain HTML result page, downloaded through a PageFetcher.
pub struct GoogleSearch {
    fetcher: Arc<dyn PageFetcher>,
    user_agent: String,
    timeout: Duration,
    results_per_page: usize,
}

impl GoogleSearch {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        user_agent: impl Into<String>,
        timeout: Duration,
        results_per_page: usize,
    ) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.into(),
            timeout,
            results_per_page,
        }
    }

    // https://www.google.com/search?q=<query>&num=<results>
    // The query is form-encoded, so "java script" becomes "java+script"
    fn search_url(&self, query: &str) -> Result<Url, FetchError> {
        let num = self.results_per_page.to_string();
        Url::parse_with_params(GOOGLE_SEARCH_URL, &[("q", query), ("num", num.as_str())])
            .map_err(|_| FetchError::InvalidUrl(GOOGLE_SEARCH_URL.to_string()))
    }
}

#[async_trait]
impl SearchSource for GoogleSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>, FetchError> {
        let url = self.search_url(query)?;
        info!(%url, "fetching search results");

        let html = self
            .fetcher
            .fetch_page(url.as_str(), &self.user_agent, self.timeout)
            .await?;

        let links = extract_anchor_targets(&html);
        debug!(count = links.len(), "anchors found on result page");
        Ok(links)
    }
}

// All href values of <a> tags, as written in the page
pub fn extract_anchor_targets(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Returns a fixed list of hrefs, or fails like an unreachable engine.
    pub struct FakeSearch {
        result: Result<Vec<String>, FetchError>,
    }

    impl FakeSearch {
        pub fn with_links(links: &[&str]) -> Self {
            Self {
                result: Ok(links.iter().map(|link| link.to_string()).collect()),
            }
        }

        pub fn failing(error: FetchError) -> Self {
            Self { result: Err(error) }
        }
    }

    #[async_trait]
    impl SearchSource for FakeSearch {
        async fn search(&self, _query: &str) -> Result<Vec<String>, FetchError> {
            self.result.clone()
        }
    }
}
