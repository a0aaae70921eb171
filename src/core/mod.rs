//! Core scheduling abstractions: tasks, policies, the scheduler and its barrier.

pub mod audit;
pub mod barrier;
pub mod error;
pub mod executor;
pub mod observer;
pub mod priority;
pub mod retry;
pub mod scheduler;
pub mod stats;
pub mod task;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use barrier::CompletionBarrier;
pub use error::{AppResult, SchedulerError};
pub use executor::{FnExecutor, TaskExecutor};
pub use observer::FailureObserver;
pub use priority::{DispatchKey, PriorityPolicy, RetryOrdering};
pub use retry::{Backoff, RetryDecision, RetryPolicy};
pub use scheduler::{Scheduler, Spawn};
pub use stats::SchedulerStats;
pub use task::{Callback, QueuedTask, Task, TaskMetadata};
