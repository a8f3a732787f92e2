// src/scan/mod.rs
// =============================================================================
// Pure HTML/link analysis, no network and no shared state.
//
// Submodules:
// - link: validates search-result anchors and canonicalizes their domain
// - script: extracts JavaScript library names from a page
//
// Both are plain functions, safe to call from any worker thread.
// =============================================================================

pub mod link;
pub mod script;

pub use link::{destination_url, validate, CanonicalDomain};
pub use script::extract_libraries;
