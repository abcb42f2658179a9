//! Crawler module for breadth-first crawling
//!
//! This module contains the core crawling logic, including:
//! - The crawl coordinator and its BFS level loop
//! - Bounded download and extraction worker pools
//! - Per-host admission control
//! - The level barrier
//! - An HTTP downloader and HTML link extraction

mod barrier;
mod coordinator;
mod fetcher;
mod host_gate;
mod parser;
mod pool;
mod traits;

pub use barrier::{Arrival, LevelBarrier};
pub use coordinator::Crawler;
pub use fetcher::{build_http_client, HttpDownloader};
pub use host_gate::{HostGate, HostPermit};
pub use parser::{extract_links, HtmlDocument};
pub use pool::{Job, WorkerPool};
pub use traits::{Document, Downloader};
