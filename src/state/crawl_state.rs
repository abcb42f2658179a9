use crate::TideError;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Shared bookkeeping for a single crawl
///
/// All collections live behind one lock so that "check enqueued, insert,
/// push to the next frontier" happens atomically, and so that an address
/// moving from `downloaded` to `errors` is never observed in both.
#[derive(Debug, Default)]
pub struct CrawlState {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Addresses successfully fetched
    downloaded: HashSet<String>,

    /// Addresses ever added to any frontier
    enqueued: HashSet<String>,

    /// Addresses that failed, with their cause
    errors: HashMap<String, TideError>,

    /// Addresses discovered during the current level
    next_frontier: Vec<String>,
}

impl CrawlState {
    /// Creates empty crawl bookkeeping
    pub fn new() -> Self {
        Self::default()
    }

    // Every guarded mutation is a single insert or remove, so a panic in
    // another holder cannot leave the collections half-updated.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Marks an address as enqueued
    ///
    /// Returns `false` if the address was already enqueued.
    pub fn try_enqueue(&self, address: &str) -> bool {
        self.lock().enqueued.insert(address.to_string())
    }

    /// Adds every not-yet-enqueued address to the next frontier
    ///
    /// Returns the number of newly enqueued addresses.
    pub fn discover<I>(&self, links: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut inner = self.lock();
        let mut added = 0;
        for link in links {
            if inner.enqueued.insert(link.clone()) {
                inner.next_frontier.push(link);
                added += 1;
            }
        }
        added
    }

    /// Takes the addresses discovered since the last call
    pub fn take_frontier(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().next_frontier)
    }

    /// Records a successful download
    pub fn record_downloaded(&self, address: &str) {
        let mut inner = self.lock();
        if !inner.errors.contains_key(address) {
            inner.downloaded.insert(address.to_string());
        }
    }

    /// Records a failure for an address
    ///
    /// An address that already downloaded is moved to the error map. The
    /// first recorded error for an address wins.
    pub fn record_error(&self, address: &str, error: TideError) {
        let mut inner = self.lock();
        inner.downloaded.remove(address);
        inner.errors.entry(address.to_string()).or_insert(error);
    }

    pub fn is_enqueued(&self, address: &str) -> bool {
        self.lock().enqueued.contains(address)
    }

    pub fn downloaded_count(&self) -> usize {
        self.lock().downloaded.len()
    }

    pub fn error_count(&self) -> usize {
        self.lock().errors.len()
    }

    /// Builds the final result, consuming the bookkeeping
    pub fn into_result(self) -> CrawlResult {
        self.take_result()
    }

    /// Builds the final result through a shared handle
    ///
    /// The error map is moved into the result; call this once, after the
    /// last level has settled.
    pub fn take_result(&self) -> CrawlResult {
        let mut inner = self.lock();
        let mut downloaded: Vec<String> = inner.downloaded.drain().collect();
        downloaded.sort();
        CrawlResult {
            downloaded,
            errors: std::mem::take(&mut inner.errors),
        }
    }
}

/// Outcome of a crawl
#[derive(Debug, Default)]
pub struct CrawlResult {
    /// Successfully downloaded addresses, sorted, without duplicates
    pub downloaded: Vec<String>,

    /// Addresses that failed, with their cause
    pub errors: HashMap<String, TideError>,
}

impl CrawlResult {
    /// Returns the human-readable reason an address failed
    pub fn error_message(&self, address: &str) -> Option<String> {
        self.errors.get(address).map(|e| e.to_string())
    }

    pub fn is_downloaded(&self, address: &str) -> bool {
        self.downloaded.binary_search_by(|d| d.as_str().cmp(address)).is_ok()
    }
}
