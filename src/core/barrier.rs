//! Completion barrier: wait until nothing is pending and nothing is running.
//!
//! The idle flag is published by the scheduler while it holds its state lock, so
//! waiters only ever observe quiescent states that really happened. A retry is
//! queued before its slot is freed, so it never produces a transient idle signal.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, MutexGuard};
use tokio::sync::watch;

/// Reusable, multi-waiter idle notification.
pub struct CompletionBarrier {
    idle_tx: watch::Sender<bool>,
    /// Paired with the scheduler state mutex for blocking waiters.
    condvar: Condvar,
}

impl CompletionBarrier {
    /// Create a barrier; a fresh scheduler is idle.
    #[must_use]
    pub fn new() -> Self {
        let (idle_tx, _) = watch::channel(true);
        Self {
            idle_tx,
            condvar: Condvar::new(),
        }
    }

    /// Publish the current idle state. Must be called with the state lock held.
    pub fn publish(&self, idle: bool) {
        let changed = self.idle_tx.send_if_modified(|current| {
            if *current == idle {
                false
            } else {
                *current = idle;
                true
            }
        });
        if changed && idle {
            self.condvar.notify_all();
        }
    }

    /// Last published state.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        *self.idle_tx.borrow()
    }

    /// Wait until the idle state is published. Returns immediately if already idle.
    pub async fn wait(&self) {
        let mut rx = self.idle_tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|idle| *idle).await;
    }

    /// Block the current thread until idle or until `timeout` elapses.
    ///
    /// `guard` must be a guard of the mutex under which [`publish`](Self::publish) is
    /// called. Returns whether the idle state was reached.
    pub fn wait_blocking<T>(&self, guard: &mut MutexGuard<'_, T>, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_idle() {
            if self.condvar.wait_until(guard, deadline).timed_out() {
                return self.is_idle();
            }
        }
        true
    }
}

impl Default for CompletionBarrier {
    fn default() -> Self {
        Self::new()
    }
}
