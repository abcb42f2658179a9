//! Bounded worker pools
//!
//! A pool is a fixed number of tokio worker tasks pulling jobs from one
//! unbounded queue. Concurrency is bounded by the worker count, not by the
//! queue: at most `size` jobs of a pool run at any moment.
//!
//! Shutdown closes the queue, lets workers drain what was already queued for
//! up to a grace period, then aborts whatever is still running. Jobs that are
//! rejected, dropped from the queue, or aborted are dropped in place, so any
//! guard they own runs its `Drop`.

use crate::{Result, TideError};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

/// A unit of work run by a pool worker
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A cloneable handle to a fixed-size pool of worker tasks
#[derive(Debug, Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    name: &'static str,
    size: usize,

    /// Job queue; `None` once the pool is closed
    queue: Mutex<Option<UnboundedSender<Job>>>,

    /// Worker tasks; taken by the first shutdown
    workers: Mutex<Option<JoinSet<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl WorkerPool {
    /// Starts a pool of `size` workers on the current tokio runtime
    ///
    /// # Returns
    ///
    /// * `Ok(WorkerPool)` - The running pool
    /// * `Err(TideError::Runtime)` - Called outside a tokio runtime
    pub fn new(name: &'static str, size: usize) -> Result<Self> {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            TideError::Runtime(format!("cannot start {} pool: {}", name, e))
        })?;

        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let mut workers = JoinSet::new();
        for id in 0..size {
            workers.spawn_on(worker_loop(name, id, Arc::clone(&receiver)), &handle);
        }

        tracing::debug!("Started {} pool with {} workers", name, size);

        Ok(Self {
            inner: Arc::new(PoolInner {
                name,
                size,
                queue: Mutex::new(Some(sender)),
                workers: Mutex::new(Some(workers)),
            }),
        })
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn size(&self) -> usize {
        self.inner.size
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.inner.queue).is_none()
    }

    /// Queues a job
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The job will run on a worker
    /// * `Err(TideError::PoolClosed)` - The pool is shut down; the job has
    ///   been dropped without running
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let queue = lock(&self.inner.queue);
        let closed = TideError::PoolClosed {
            pool: self.inner.name,
        };

        match queue.as_ref() {
            Some(sender) => sender.send(Box::pin(job)).map_err(|_| closed),
            None => Err(closed),
        }
    }

    /// Stops the pool
    ///
    /// Closes the queue, waits up to `grace` for workers to drain it, then
    /// aborts the rest. Only the first call does any work.
    pub async fn shutdown(&self, grace: Duration) {
        lock(&self.inner.queue).take();

        let workers = lock(&self.inner.workers).take();
        let Some(mut workers) = workers else {
            return;
        };

        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    if e.is_panic() {
                        tracing::error!("{} worker panicked: {}", self.inner.name, e);
                    }
                }
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                "{} pool did not drain within {:?}, aborting {} workers",
                self.inner.name,
                grace,
                workers.len()
            );
            workers.shutdown().await;
        }

        tracing::debug!("{} pool stopped", self.inner.name);
    }
}

/// Pulls jobs until the queue is closed and empty
async fn worker_loop(
    name: &'static str,
    id: usize,
    receiver: Arc<tokio::sync::Mutex<UnboundedReceiver<Job>>>,
) {
    loop {
        let job = {
            let mut receiver = receiver.lock().await;
            receiver.recv().await
        };

        match job {
            Some(job) => job.await,
            None => break,
        }
    }
    tracing::trace!("{} worker {} exiting", name, id);
}
