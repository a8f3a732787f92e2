// src/fetch/mod.rs
// =============================================================================
// Network collaborators of the crawl.
//
// Submodules:
// - http: PageFetcher trait + the reqwest implementation
// - search: SearchSource trait + the Google result-page implementation
//
// Both are unreliable, latency-bearing calls; callers decide what a failure
// means (the crawl treats a failed page as "no libraries").
// =============================================================================

mod http;
mod search;

pub use http::{HttpFetcher, PageFetcher};
pub use search::{GoogleSearch, SearchSource};
