//! Level barrier for the breadth-first loop
//!
//! A generation barrier whose expected-arrival count may grow while a level
//! is in flight. A download task registers the extraction it spawns before
//! it arrives itself, so the count can only reach zero once every download
//! of the level and every extraction they spawned has finished.
//!
//! ```text
//! OPEN (pending > 0) ──arrivals──▶ DRAINING (registrations still accepted)
//!        ▲                                   │ pending == 0
//!        └────── next level ◀── CLOSED ◀─────┘ (await_advance returns)
//! ```

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Synchronizes the orchestrator with all work spawned for one BFS depth
#[derive(Debug, Default)]
pub struct LevelBarrier {
    /// Registered parties that have not arrived yet
    pending: AtomicUsize,

    /// Number of levels that have closed
    generation: AtomicU64,

    notify: Notify,
}

impl LevelBarrier {
    /// Creates a barrier with no registered parties
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more party for the current generation
    ///
    /// The returned guard arrives when it is consumed with
    /// [`Arrival::arrive`] or dropped, so a task that is cancelled or never
    /// polled still releases the level.
    ///
    /// Registration after the level has started is allowed only from a party
    /// that has not arrived yet.
    pub fn register(self: &Arc<Self>) -> Arrival {
        self.pending.fetch_add(1, Ordering::AcqRel);
        Arrival {
            barrier: Arc::clone(self),
        }
    }

    fn arrive(&self) {
        let previous = self.pending.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "arrival without registration");
        if previous == 1 {
            self.notify.notify_waiters();
        }
    }

    /// Number of parties still expected in the current generation
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Number of generations closed so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Waits until every registered party has arrived
    ///
    /// Only the orchestrator calls this. Returns the generation that just
    /// closed; the barrier is then open for the next level.
    pub async fn await_advance(&self) -> u64 {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Enable before the check so a wakeup between the load and the
            // await is not lost.
            notified.as_mut().enable();

            if self.pending.load(Ordering::Acquire) == 0 {
                return self.generation.fetch_add(1, Ordering::AcqRel);
            }

            notified.await;
        }
    }
}

/// A registered, not-yet-arrived party on a [`LevelBarrier`]
#[derive(Debug)]
#[must_use = "dropping an Arrival arrives immediately"]
pub struct Arrival {
    barrier: Arc<LevelBarrier>,
}

impl Arrival {
    /// Arrives on the barrier
    pub fn arrive(self) {
        drop(self);
    }

    /// The barrier this party is registered on
    pub fn barrier(&self) -> &Arc<LevelBarrier> {
        &self.barrier
    }
}

impl Drop for Arrival {
    fn drop(&mut self) {
        self.barrier.arrive();
    }
}
