//! Failure observation hook.

use super::SchedulerError;
use crate::util::serde::TaskId;

/// Receives failure information from the scheduler.
///
/// Invoked with [`SchedulerError::WorkerFailure`] for every failed attempt and with
/// [`SchedulerError::RetriesExhausted`] when a task is abandoned. `attempts` is the
/// number of attempts made so far.
///
/// When a retry is granted it is already queued by the time the hook sees the
/// `WorkerFailure`, so calling [`Scheduler::cancel`](crate::core::Scheduler::cancel)
/// from the hook withdraws it. With more than one slot the retry may already have
/// started elsewhere, in which case `cancel` returns `false`. Hooks run outside the
/// scheduler's lock.
pub trait FailureObserver: Send + Sync + 'static {
    /// Handle one failure report.
    fn on_failure(&self, task_id: TaskId, error: &SchedulerError, attempts: u32);
}

impl<F> FailureObserver for F
where
    F: Fn(TaskId, &SchedulerError, u32) + Send + Sync + 'static,
{
    fn on_failure(&self, task_id: TaskId, error: &SchedulerError, attempts: u32) {
        self(task_id, error, attempts);
    }
}
