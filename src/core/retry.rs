//! Retry decisions for failed attempts.

use std::time::Duration;

/// Delay applied before a retried task re-enters the pending queue.
///
/// `None` re-enqueues immediately, which is the default behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Re-enqueue immediately.
    #[default]
    None,
    /// Wait the same delay before every retry.
    Fixed(Duration),
    /// Double the delay for every retry, starting at `base`, capped at `max`.
    Exponential {
        /// Delay before the first retry.
        base: Duration,
        /// Upper bound for any single delay.
        max: Duration,
    },
}

impl Backoff {
    /// Reject schedules whose bounds contradict each other.
    ///
    /// # Errors
    ///
    /// Returns a description when an exponential base exceeds its cap.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Self::Exponential { base, max } if base > max => Err(format!(
                "exponential backoff base ({}ms) exceeds max ({}ms)",
                base.as_millis(),
                max.as_millis()
            )),
            _ => Ok(()),
        }
    }

    /// Delay before retry number `retry` (1-based), or `None` for an immediate retry.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Option<Duration> {
        match *self {
            Self::None => None,
            Self::Fixed(delay) => Some(delay).filter(|d| !d.is_zero()),
            Self::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(retry.saturating_sub(1));
                Some(base.saturating_mul(factor).min(max)).filter(|d| !d.is_zero())
            }
        }
    }
}

/// Outcome of consulting the retry policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-admit the task, optionally after a delay.
    Retry {
        /// Backoff before re-admission.
        delay: Option<Duration>,
    },
    /// The retry budget is spent; retire the task as terminally failed.
    Exhausted,
}

/// Decides whether a failed task is re-admitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    limit: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    /// Policy allowing `limit` retries per task, re-enqueued immediately.
    #[must_use]
    pub const fn new(limit: u32) -> Self {
        Self {
            limit,
            backoff: Backoff::None,
        }
    }

    /// Attach a backoff schedule.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Scheduler-wide retry limit.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Configured backoff schedule.
    #[must_use]
    pub const fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Decide what to do after attempt number `attempt` (1-based) failed.
    ///
    /// `task_limit` overrides the scheduler-wide limit when present.
    #[must_use]
    pub fn decide(&self, attempt: u32, task_limit: Option<u32>) -> RetryDecision {
        let limit = task_limit.unwrap_or(self.limit);
        let retries_used = attempt.saturating_sub(1);
        if retries_used < limit {
            RetryDecision::Retry {
                delay: self.backoff.delay_for(retries_used + 1),
            }
        } else {
            RetryDecision::Exhausted
        }
    }
}
