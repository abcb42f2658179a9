//! State module for tracking crawl progress
//!
//! This module provides the per-crawl bookkeeping shared by every worker.
//!
//! # Components
//!
//! - `CrawlState`: downloaded set, dedup set, error map and next frontier
//! - `CrawlResult`: the immutable snapshot returned to the caller

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlResult, CrawlState};
