//! # Prometheus Task Scheduler
//!
//! A bounded-concurrency scheduler for asynchronous work.
//!
//! Callers submit tasks; the scheduler runs at most `concurrency_limit` of them at a
//! time, highest priority first (FIFO among equal priorities), and keeps itself busy:
//! every submission, completion, failure and resume re-attempts dispatch until the
//! limit, the pause flag, or an empty queue stops it.
//!
//! ## Key Features
//!
//! - **Priority ordering**: numeric priorities, stable for equal values
//! - **Retry on failure**: scheduler-wide or per-task limits, optional backoff
//! - **Cancellation**: tasks that have not started can be withdrawn
//! - **Pause / resume**: running work finishes, nothing new starts
//! - **Completion barrier**: wait (async or blocking) until nothing is pending or running
//! - **Observability**: failure hook, audit trail, statistics, `tracing` logs
//!
//! ## Example
//!
//! ```rust,ignore
//! use prometheus_task_scheduler::builders::SchedulerBuilder;
//! use prometheus_task_scheduler::core::{FnExecutor, Task, TaskMetadata};
//!
//! let scheduler = SchedulerBuilder::new()
//!     .with_concurrency_limit(3)
//!     .with_retry_limit(2)
//!     .with_executor(FnExecutor::new(|n: &u64, _meta: TaskMetadata| {
//!         let n = *n;
//!         async move {
//!             tokio::time::sleep(std::time::Duration::from_millis(n)).await;
//!             Ok(n * 2)
//!         }
//!     }))
//!     .build()?;
//!
//! scheduler.submit(Task::new(10));
//! scheduler.submit(
//!     Task::new(5)
//!         .with_priority(9)
//!         .with_callback(|n, doubled| println!("{n} -> {doubled}")),
//! );
//! scheduler.await_idle().await;
//! ```
//!
//! For complete scenarios, see `tests/scheduler_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: tasks, policies, the scheduler and its barrier.
pub mod core;
/// Configuration models for the scheduler and retry policy.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Infrastructure backing the scheduler's bookkeeping.
pub mod infra;
/// Runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
