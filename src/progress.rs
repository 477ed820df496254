//! Collect-progress counter with a wake signal.
//!
//! The counter is an atomic read without the reporter's state lock. Waiters
//! sleep on a condition variable paired with a private gate mutex, so checking
//! progress never contends with producers for the state lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::warn;

use crate::errors::{Result, TopSqlError};

#[derive(Debug, Default)]
pub struct CollectProgress {
    count: AtomicU64,
    gate: Mutex<()>,
    signal: Condvar,
}

impl CollectProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Bump the counter and wake every waiter. Returns the new value.
    pub fn advance(&self) -> u64 {
        let value = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        // Taking the gate orders this notify after any waiter's check-then-sleep.
        let _gate = self.gate.lock();
        self.signal.notify_all();
        value
    }

    /// Guard that advances the counter when dropped, on every exit path.
    pub fn advance_on_drop(&self) -> AdvanceOnDrop<'_> {
        AdvanceOnDrop { progress: self }
    }

    /// Block until the counter reaches `current + count` or `timeout` elapses.
    ///
    /// `slice` bounds each individual sleep. Returns the observed counter value
    /// on success.
    pub fn wait_for_advance(&self, count: u64, timeout: Duration, slice: Duration) -> Result<u64> {
        let started = Instant::now();
        let deadline = started + timeout;
        let target = self.load().saturating_add(count);

        let mut gate = self.gate.lock();
        loop {
            let observed = self.load();
            if observed >= target {
                return Ok(observed);
            }
            let now = Instant::now();
            if now >= deadline {
                let waited = now.duration_since(started);
                warn!(target_count = target, observed, ?waited, "collect wait timed out");
                return Err(TopSqlError::timeout(waited, target, observed));
            }
            let wake_at = deadline.min(now + slice);
            self.signal.wait_until(&mut gate, wake_at);
        }
    }
}

pub struct AdvanceOnDrop<'a> {
    progress: &'a CollectProgress,
}

impl Drop for AdvanceOnDrop<'_> {
    fn drop(&mut self) {
        self.progress.advance();
    }
}
