//! Per-host admission control
//!
//! Each host gets a counting semaphore of capacity `per_host`, created on
//! first use. A download worker holds a [`HostPermit`] only for the duration
//! of the network fetch; dropping the permit returns the slot on every exit
//! path.

use crate::TideError;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Named counting semaphores keyed by host
#[derive(Debug)]
pub struct HostGate {
    /// Map of host to its semaphore, created on demand
    hosts: DashMap<String, Arc<Semaphore>>,

    /// Capacity of every host semaphore
    per_host: usize,
}

/// A held slot for one host, released on drop
#[derive(Debug)]
pub struct HostPermit {
    host: String,
    _permit: OwnedSemaphorePermit,
}

impl HostPermit {
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl HostGate {
    /// Creates a gate allowing `per_host` concurrent holders per host
    pub fn new(per_host: usize) -> Self {
        Self {
            hosts: DashMap::new(),
            per_host,
        }
    }

    /// Gets or creates the semaphore for a host
    ///
    /// `entry` holds the shard lock across the check and the insert, so two
    /// workers seeing a host for the first time share one semaphore.
    fn semaphore(&self, host: &str) -> Arc<Semaphore> {
        self.hosts
            .entry(host.to_string())
            .or_insert_with(|| {
                tracing::trace!("Creating host gate for {} ({} slots)", host, self.per_host);
                Arc::new(Semaphore::new(self.per_host))
            })
            .clone()
    }

    /// Waits for a free slot for `host`
    ///
    /// The map shard is not locked while waiting.
    ///
    /// # Returns
    ///
    /// * `Ok(HostPermit)` - The slot, released when dropped
    /// * `Err(TideError::Interrupted)` - The gate was closed
    pub async fn acquire(&self, host: &str, url: &str) -> Result<HostPermit, TideError> {
        let semaphore = self.semaphore(host);
        let permit = semaphore
            .acquire_owned()
            .await
            .map_err(|_| TideError::Interrupted {
                url: url.to_string(),
            })?;

        Ok(HostPermit {
            host: host.to_string(),
            _permit: permit,
        })
    }

    /// Closes every host semaphore seen so far, failing their waiters
    pub fn close(&self) {
        for entry in self.hosts.iter() {
            entry.value().close();
        }
    }

    /// Number of hosts seen so far
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Free slots for a host, or `None` if the host has not been seen
    pub fn available(&self, host: &str) -> Option<usize> {
        self.hosts.get(host).map(|s| s.available_permits())
    }
}
