//! Statistics over a finished crawl

use crate::state::CrawlResult;
use std::collections::HashSet;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Number of addresses downloaded
    pub downloaded: usize,

    /// Addresses that failed to download
    pub fetch_failures: usize,

    /// Addresses whose links could not be extracted
    pub extract_failures: usize,

    /// Addresses cut short by shutdown
    pub interrupted: usize,

    /// Number of distinct hosts among downloaded addresses
    pub unique_hosts: usize,
}

impl CrawlStatistics {
    /// Computes statistics from a crawl result
    pub fn from_result(result: &CrawlResult) -> Self {
        let mut stats = Self {
            downloaded: result.downloaded.len(),
            ..Self::default()
        };

        for error in result.errors.values() {
            if error.is_extract_failure() {
                stats.extract_failures += 1;
            } else if error.is_interrupted() {
                stats.interrupted += 1;
            } else {
                stats.fetch_failures += 1;
            }
        }

        stats.unique_hosts = result
            .downloaded
            .iter()
            .filter_map(|address| crate::url::extract_host(address).ok())
            .collect::<HashSet<_>>()
            .len();

        stats
    }

    /// Total number of failed addresses
    pub fn failed(&self) -> usize {
        self.fetch_failures + self.extract_failures + self.interrupted
    }

    /// Share of attempted addresses that downloaded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.downloaded + self.failed();
        if attempted == 0 {
            0.0
        } else {
            (self.downloaded as f64 / attempted as f64) * 100.0
        }
    }
}

/// Logs statistics and every per-address error
pub fn log_statistics(stats: &CrawlStatistics, result: &CrawlResult) {
    tracing::info!(
        "Downloaded {} pages from {} hosts ({:.1}% success)",
        stats.downloaded,
        stats.unique_hosts,
        stats.success_rate()
    );

    if stats.failed() > 0 {
        tracing::warn!(
            "{} failures: {} fetch, {} extract, {} interrupted",
            stats.failed(),
            stats.fetch_failures,
            stats.extract_failures,
            stats.interrupted
        );

        let mut errors: Vec<_> = result.errors.iter().collect();
        errors.sort_by(|a, b| a.0.cmp(b.0));
        for (address, error) in errors {
            tracing::debug!("{}: {}", address, error);
        }
    }
}
