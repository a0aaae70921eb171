//! Builder assembling a [`Scheduler`] from configuration and collaborators.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::scheduler::SchedulerParts;
use crate::core::{
    AuditSink, Backoff, FailureObserver, PriorityPolicy, RetryOrdering, RetryPolicy, Scheduler,
    SchedulerError, Spawn, TaskExecutor,
};
use crate::runtime::TokioSpawner;
use crate::util::serde::Priority;

/// Fluent builder for [`Scheduler`].
///
/// The executor is required. Without an explicit spawner the scheduler spawns on the
/// tokio runtime that calls [`build`](Self::build).
pub struct SchedulerBuilder<E, S = TokioSpawner> {
    concurrency_limit: usize,
    retry: RetryPolicy,
    retry_ordering: RetryOrdering,
    executor: Option<E>,
    spawner: Option<S>,
    observer: Option<Arc<dyn FailureObserver>>,
    audit: Option<Box<dyn AuditSink>>,
}

impl<E> SchedulerBuilder<E> {
    /// Start from [`SchedulerConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }

    /// Start from an existing configuration. Its values are checked again in
    /// [`build`](Self::build), together with any later overrides.
    #[must_use]
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            concurrency_limit: config.concurrency_limit,
            retry: config.retry.policy(),
            retry_ordering: config.retry.ordering,
            executor: None,
            spawner: None,
            observer: None,
            audit: None,
        }
    }
}

impl<E> Default for SchedulerBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, S> SchedulerBuilder<E, S> {
    /// Priority assigned to tasks that do not set one.
    #[must_use]
    pub const fn default_priority() -> Priority {
        Priority::DEFAULT
    }

    /// Maximum tasks in flight.
    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Scheduler-wide retry limit (tasks may override it).
    #[must_use]
    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry = RetryPolicy::new(limit).with_backoff(self.retry.backoff());
        self
    }

    /// Delay schedule applied before retries.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.retry = self.retry.with_backoff(backoff);
        self
    }

    /// Where retried tasks re-enter the dispatch order.
    #[must_use]
    pub fn with_retry_ordering(mut self, ordering: RetryOrdering) -> Self {
        self.retry_ordering = ordering;
        self
    }

    /// Worker invoked for every attempt.
    #[must_use]
    pub fn with_executor(mut self, executor: E) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Hook receiving failed attempts and exhausted tasks.
    #[must_use]
    pub fn with_observer(mut self, observer: impl FailureObserver) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Spawn worker invocations with a custom runtime adapter.
    #[must_use]
    pub fn with_spawner<T>(self, spawner: T) -> SchedulerBuilder<E, T> {
        SchedulerBuilder {
            concurrency_limit: self.concurrency_limit,
            retry: self.retry,
            retry_ordering: self.retry_ordering,
            executor: self.executor,
            spawner: Some(spawner),
            observer: self.observer,
            audit: self.audit,
        }
    }

    /// Configured concurrency limit.
    #[must_use]
    pub const fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Configured retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Validate and assemble the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfiguration`] when the concurrency limit is 0,
    /// the backoff bounds are inverted, no executor was supplied, or no spawner was
    /// supplied and no tokio runtime is running.
    pub fn build<P, R>(self) -> Result<Scheduler<P, R, E, S>, SchedulerError>
    where
        P: Send + Sync + 'static,
        R: Send + 'static,
        E: TaskExecutor<P, R>,
        S: Spawn + Send + Sync + 'static,
    {
        if self.concurrency_limit == 0 {
            return Err(SchedulerError::InvalidConfiguration(
                "concurrency_limit must be greater than 0".into(),
            ));
        }
        self.retry
            .backoff()
            .validate()
            .map_err(SchedulerError::InvalidConfiguration)?;
        let executor = self.executor.ok_or_else(|| {
            SchedulerError::InvalidConfiguration("an executor is required".into())
        })?;
        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => S::ambient().ok_or_else(|| {
                SchedulerError::InvalidConfiguration(
                    "no spawner supplied and no ambient runtime available".into(),
                )
            })?,
        };

        Scheduler::from_parts(SchedulerParts {
            concurrency_limit: self.concurrency_limit,
            retry: self.retry,
            priority: PriorityPolicy::new(self.retry_ordering),
            executor,
            spawner,
            observer: self.observer,
            audit: self.audit,
        })
    }
}
