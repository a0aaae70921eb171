//! Task records: what callers submit and what the scheduler queues.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::serde::{Priority, TaskId};

/// Completion callback, invoked once with the payload and the worker's result.
pub type Callback<P, R> = Box<dyn FnOnce(P, R) + Send + 'static>;

/// A unit of work as submitted by a caller.
///
/// The identity is assigned by the scheduler on submission.
pub struct Task<P, R> {
    pub(crate) payload: P,
    pub(crate) priority: Priority,
    pub(crate) retry_limit: Option<u32>,
    pub(crate) callback: Option<Callback<P, R>>,
}

impl<P, R> Task<P, R> {
    /// Create a task with default priority, no callback and the scheduler-wide retry limit.
    pub const fn new(payload: P) -> Self {
        Self {
            payload,
            priority: Priority::DEFAULT,
            retry_limit: None,
            callback: None,
        }
    }

    /// Set the dispatch priority.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Override the scheduler-wide retry limit for this task.
    #[must_use]
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = Some(retry_limit);
        self
    }

    /// Attach a callback fired once after a successful run.
    #[must_use]
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(P, R) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Payload carried by this task.
    pub const fn payload(&self) -> &P {
        &self.payload
    }

    /// Whether a callback is attached.
    pub const fn has_callback(&self) -> bool {
        self.callback.is_some()
    }
}

impl<P: fmt::Debug, R> fmt::Debug for Task<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("payload", &self.payload)
            .field("priority", &self.priority)
            .field("retry_limit", &self.retry_limit)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Metadata handed to the executor alongside the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Task identifier.
    pub id: TaskId,
    /// Priority used for queue ordering.
    pub priority: Priority,
    /// 1-based attempt number; greater than 1 for retries.
    pub attempt: u32,
    /// Submission timestamp in milliseconds since epoch.
    pub created_at_ms: u128,
}

/// A scheduling entry: one admission of a task into the pending queue.
///
/// A retry produces a new entry carrying the same identity with `attempt + 1`.
pub struct QueuedTask<P, R> {
    /// Identity and ordering metadata.
    pub meta: TaskMetadata,
    /// Submission sequence number, fresh for every admission.
    pub seq: u64,
    /// The caller's task.
    pub task: Task<P, R>,
}

impl<P, R> QueuedTask<P, R> {
    /// Number of retries already granted to this task.
    pub const fn retry_count(&self) -> u32 {
        self.meta.attempt.saturating_sub(1)
    }

    /// Consume this entry and produce the entry for its next attempt.
    #[must_use]
    pub fn into_retry(self, seq: u64) -> Self {
        Self {
            meta: TaskMetadata {
                attempt: self.meta.attempt + 1,
                ..self.meta
            },
            seq,
            task: self.task,
        }
    }
}

impl<P: fmt::Debug, R> fmt::Debug for QueuedTask<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedTask")
            .field("meta", &self.meta)
            .field("seq", &self.seq)
            .field("task", &self.task)
            .finish()
    }
}
