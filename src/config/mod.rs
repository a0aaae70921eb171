//! Configuration models for the scheduler and its retry policy.

pub mod scheduler;

pub use scheduler::{
    BackoffConfig, RetryConfig, SchedulerConfig, ENV_CONCURRENCY_LIMIT, ENV_RETRY_BACKOFF_MS,
    ENV_RETRY_LIMIT,
};
