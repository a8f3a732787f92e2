// src/crawl/mod.rs
// =============================================================================
// This module handles the crawl itself.
//
// Submodules:
// - dispatcher: bounded worker pool + completion barrier
// - tally: concurrent library counts and top-K ranking
// - orchestrator: ties search, validation, workers and ranking together
//
// Rust concepts:
// - Arc: shared ownership of the tally between worker tasks
// - Async programming: workers wait on the network, not on each other
// =============================================================================

mod dispatcher;
mod orchestrator;
mod tally;

pub use dispatcher::Completion;
pub use orchestrator::{CrawlReport, Crawler, PageScan};
