//! Error types for scheduler operations.

use thiserror::Error;

use crate::util::serde::TaskId;

/// Errors produced by scheduler components.
///
/// Worker failures never escape to the `submit` caller; they are reported through
/// the [`FailureObserver`](crate::core::FailureObserver) hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// A single execution attempt of the worker failed.
    #[error("task {task_id} attempt {attempt} failed: {reason}")]
    WorkerFailure {
        /// Task that failed.
        task_id: TaskId,
        /// 1-based attempt number.
        attempt: u32,
        /// Rendered error chain reported by the worker.
        reason: String,
    },
    /// Every permitted attempt failed; the task was retired without its callback.
    #[error("task {task_id} abandoned after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Task that was abandoned.
        task_id: TaskId,
        /// Total attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last_error: String,
    },
    /// Scheduler was constructed with an invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A bounded wait elapsed before the scheduler became idle.
    #[error("timed out waiting for scheduler to become idle")]
    Timeout,
}

impl SchedulerError {
    /// Task the error refers to, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::WorkerFailure { task_id, .. } | Self::RetriesExhausted { task_id, .. } => {
                Some(*task_id)
            }
            Self::InvalidConfiguration(_) | Self::Timeout => None,
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
