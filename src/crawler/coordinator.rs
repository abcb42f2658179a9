//! Crawler coordinator - breadth-first crawl orchestration
//!
//! This module contains the crawl loop that coordinates:
//! - The download pool and the extraction pool
//! - Per-host admission control
//! - The level barrier between BFS depths
//! - Deduplication of discovered addresses
//! - Draining and cancellation on shutdown
//!
//! # Level lifecycle
//!
//! For each depth the coordinator registers one barrier party per frontier
//! address and submits a download job for it. A successful download with
//! depth left registers one more party for its extraction job before
//! settling, so the level closes only when every download and every
//! extraction spawned during it has finished.

use crate::config::{validate_pool_sizes, CrawlerConfig};
use crate::crawler::barrier::{Arrival, LevelBarrier};
use crate::crawler::host_gate::HostGate;
use crate::crawler::pool::WorkerPool;
use crate::crawler::traits::{Document, Downloader};
use crate::state::{CrawlResult, CrawlState};
use crate::url::extract_host;
use crate::{ConfigError, Result, TideError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Bounded-concurrency breadth-first crawler
///
/// The two worker pools live as long as the crawler and are shared by every
/// crawl run on it; crawl bookkeeping and host gates are created per crawl.
pub struct Crawler {
    downloader: Arc<dyn Downloader>,
    downloads: WorkerPool,
    extractions: WorkerPool,
    per_host: usize,
    shutdown_grace: Duration,
    closed: AtomicBool,
}

/// Everything a job of one crawl needs
struct CrawlContext {
    downloader: Arc<dyn Downloader>,
    extractions: WorkerPool,
    gate: HostGate,
    state: Arc<CrawlState>,
    barrier: Arc<LevelBarrier>,
}

/// One registered unit of level work for an address
///
/// Settling records nothing; dropping an unsettled task records
/// `Interrupted` for the address. Either way the barrier arrival happens
/// after, when the arrival guard is dropped.
struct LevelTask {
    url: String,
    state: Arc<CrawlState>,
    _arrival: Arrival,
    settled: bool,
}

impl LevelTask {
    fn new(url: String, state: Arc<CrawlState>, arrival: Arrival) -> Self {
        Self {
            url,
            state,
            _arrival: arrival,
            settled: false,
        }
    }

    fn settle(mut self) {
        self.settled = true;
    }

    fn fail(self, error: TideError) {
        self.state.record_error(&self.url, error);
        self.settle();
    }
}

impl Drop for LevelTask {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!("Task for {} dropped before completion", self.url);
            self.state.record_error(
                &self.url,
                TideError::Interrupted {
                    url: self.url.clone(),
                },
            );
        }
    }
}

impl Crawler {
    /// Creates a crawler and starts its worker pools
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Pools are running
    /// * `Err(TideError::Config)` - A pool size or the per-host cap is zero
    /// * `Err(TideError::Runtime)` - No runtime to start the pools on
    pub fn new(downloader: Arc<dyn Downloader>, config: &CrawlerConfig) -> Result<Self> {
        validate_pool_sizes(config)?;

        if config.per_host > config.downloaders {
            tracing::warn!(
                "per-host cap {} does not bind with {} downloaders",
                config.per_host,
                config.downloaders
            );
        }

        let downloads = WorkerPool::new("download", config.downloaders)?;
        let extractions = WorkerPool::new("extract", config.extractors)?;

        Ok(Self {
            downloader,
            downloads,
            extractions,
            per_host: config.per_host,
            shutdown_grace: config.shutdown_grace(),
            closed: AtomicBool::new(false),
        })
    }

    /// Creates a crawler with the given pool sizes and default grace period
    pub fn with_limits(
        downloader: Arc<dyn Downloader>,
        downloaders: usize,
        extractors: usize,
        per_host: usize,
    ) -> Result<Self> {
        Self::new(
            downloader,
            &CrawlerConfig::new(downloaders, extractors, per_host),
        )
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Crawls breadth-first from `url`, visiting at most `depth` levels
    ///
    /// `depth = 1` downloads only `url` and extracts nothing. Per-address
    /// failures are recorded in the result, never returned.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - Downloaded addresses and per-address errors;
    ///   partial if the crawler was shut down mid-crawl
    /// * `Err(TideError::Config)` - Empty address or zero depth
    /// * `Err(TideError::Shutdown)` - The crawler is already shut down
    pub async fn crawl(&self, url: &str, depth: u32) -> Result<CrawlResult> {
        if self.is_closed() {
            return Err(TideError::Shutdown);
        }
        if url.trim().is_empty() {
            return Err(
                ConfigError::Validation("start address cannot be empty".to_string()).into(),
            );
        }
        if depth < 1 {
            return Err(
                ConfigError::Validation(format!("depth must be >= 1, got {}", depth)).into(),
            );
        }

        let started = Instant::now();
        let state = Arc::new(CrawlState::new());
        let context = Arc::new(CrawlContext {
            downloader: Arc::clone(&self.downloader),
            extractions: self.extractions.clone(),
            gate: HostGate::new(self.per_host),
            state: Arc::clone(&state),
            barrier: Arc::new(LevelBarrier::new()),
        });

        state.try_enqueue(url);
        let mut frontier = vec![url.to_string()];
        let mut remaining = depth;

        tracing::info!("Starting crawl of {} to depth {}", url, depth);

        while !frontier.is_empty() && remaining > 0 {
            if self.is_closed() {
                tracing::info!(
                    "Crawler shut down, abandoning {} queued addresses",
                    frontier.len()
                );
                for address in frontier.drain(..) {
                    let error = TideError::Interrupted {
                        url: address.clone(),
                    };
                    state.record_error(&address, error);
                }
                break;
            }

            let level = depth - remaining;
            let extract = remaining > 1;
            tracing::debug!("Level {}: {} addresses", level, frontier.len());

            for address in frontier.drain(..) {
                let task = LevelTask::new(address, Arc::clone(&state), context.barrier.register());
                let job = download(task, Arc::clone(&context), extract);
                if let Err(e) = self.downloads.submit(job) {
                    // The rejected job was dropped and recorded as interrupted.
                    tracing::debug!("{}", e);
                }
            }

            context.barrier.await_advance().await;

            frontier = state.take_frontier();
            remaining -= 1;

            tracing::debug!(
                "Level {} done: {} downloaded, {} errors, {} discovered",
                level,
                state.downloaded_count(),
                state.error_count(),
                frontier.len()
            );
        }

        context.gate.close();
        let result = state.take_result();

        tracing::info!(
            "Crawl of {} finished in {:?}: {} downloaded, {} errors",
            url,
            started.elapsed(),
            result.downloaded.len(),
            result.errors.len()
        );

        Ok(result)
    }

    /// Shuts the crawler down
    ///
    /// Stops accepting crawls, closes both pools, waits up to the grace
    /// period for queued and running jobs, then aborts the rest. Aborted or
    /// dropped jobs are recorded as interrupted, so a crawl in progress
    /// returns a partial result instead of hanging. Calling this again does
    /// nothing.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        tracing::info!("Shutting down crawler");
        tokio::join!(
            self.downloads.shutdown(self.shutdown_grace),
            self.extractions.shutdown(self.shutdown_grace)
        );
        tracing::info!("Crawler shut down");
    }
}

/// Download job: fetch under the host gate, then hand off to extraction
async fn download(task: LevelTask, context: Arc<CrawlContext>, extract: bool) {
    let document = match fetch(&context, &task.url).await {
        Ok(document) => document,
        Err(e) => {
            tracing::debug!("Download failed for {}: {}", task.url, e);
            task.fail(e);
            return;
        }
    };

    context.state.record_downloaded(&task.url);
    tracing::debug!("Downloaded {}", task.url);

    if extract {
        // Registered before this task settles, so the level cannot close
        // between the two.
        let child = LevelTask::new(
            task.url.clone(),
            Arc::clone(&context.state),
            context.barrier.register(),
        );
        let job = extract_links(child, document, Arc::clone(&context));
        if let Err(e) = context.extractions.submit(job) {
            tracing::debug!("{}", e);
        }
    }

    task.settle();
}

/// Fetches one address while holding a slot for its host
async fn fetch(context: &CrawlContext, url: &str) -> Result<Box<dyn Document>> {
    let host = extract_host(url)?;
    let _permit = context.gate.acquire(&host, url).await?;
    context.downloader.download(url).await
}

/// Extraction job: list the document's links and grow the next frontier
async fn extract_links(task: LevelTask, document: Box<dyn Document>, context: Arc<CrawlContext>) {
    match document.extract_links().await {
        Ok(links) => {
            let found = links.len();
            let added = context.state.discover(links);
            tracing::trace!("{}: {} links, {} new", task.url, found, added);
            task.settle();
        }
        Err(e) => {
            tracing::debug!("Extraction failed for {}: {}", task.url, e);
            task.fail(e);
        }
    }
}

impl Drop for Crawler {
    fn drop(&mut self) {
        if !self.is_closed() {
            tracing::debug!("Crawler dropped without shutdown, aborting workers");
        }
    }
}
