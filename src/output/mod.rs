//! Output module for crawl results
//!
//! This module handles:
//! - Writing the downloaded addresses, one per line
//! - Summarising failures as statistics

pub mod stats;

pub use stats::{log_statistics, CrawlStatistics};

use crate::state::CrawlResult;
use std::io::Write;

/// Writes each downloaded address on its own line
pub fn write_downloaded<W: Write>(result: &CrawlResult, writer: &mut W) -> std::io::Result<()> {
    for address in &result.downloaded {
        writeln!(writer, "{}", address)?;
    }
    writer.flush()
}
