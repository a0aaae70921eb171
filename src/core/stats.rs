//! Scheduler statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time view of scheduler utilisation and lifetime totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Maximum tasks in flight.
    pub concurrency_limit: usize,
    /// Tasks currently executing.
    pub running: usize,
    /// Tasks waiting to run (including those backing off), excluding cancelled ones.
    pub pending: usize,
    /// Tasks waiting out a retry backoff.
    pub backing_off: usize,
    /// Whether dispatch is paused.
    pub paused: bool,
    /// Total tasks submitted.
    pub submitted: u64,
    /// Tasks that completed successfully.
    pub succeeded: u64,
    /// Individual attempts that failed.
    pub failed_attempts: u64,
    /// Re-admissions granted by the retry policy.
    pub retried: u64,
    /// Tasks abandoned after exhausting retries.
    pub exhausted: u64,
    /// Tasks cancelled before running.
    pub cancelled: u64,
}

/// Lifetime counters (lock-free atomics).
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub submitted: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed_attempts: AtomicU64,
    pub retried: AtomicU64,
    pub exhausted: AtomicU64,
    pub cancelled: AtomicU64,
}

impl SchedulerCounters {
    /// Combine the counters with live queue state into a snapshot.
    pub fn snapshot(
        &self,
        concurrency_limit: usize,
        running: usize,
        pending: usize,
        backing_off: usize,
        paused: bool,
    ) -> SchedulerStats {
        SchedulerStats {
            concurrency_limit,
            running,
            pending,
            backing_off,
            paused,
            submitted: self.submitted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }

    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
