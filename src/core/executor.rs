//! Worker abstraction: the caller-supplied capability that performs a task's work.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use super::TaskMetadata;

/// Performs the work for one task attempt.
///
/// The scheduler treats every invocation as a single suspension point that resolves
/// to success (`Ok(result)`) or failure (`Err`). A panic inside `execute` is caught
/// and reported as a failed attempt.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_task_scheduler::core::{TaskExecutor, TaskMetadata};
///
/// struct Fetcher;
///
/// #[async_trait]
/// impl TaskExecutor<String, usize> for Fetcher {
///     async fn execute(&self, url: &String, _meta: TaskMetadata) -> anyhow::Result<usize> {
///         Ok(url.len())
///     }
/// }
/// ```
#[async_trait]
pub trait TaskExecutor<P, R>: Send + Sync + 'static
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Execute one attempt of a task.
    ///
    /// The payload is borrowed so the same value can be retried after a failure.
    async fn execute(&self, payload: &P, meta: TaskMetadata) -> anyhow::Result<R>;
}

/// Adapter turning a closure into a [`TaskExecutor`].
///
/// The closure receives a borrowed payload and must return an owned future, so it
/// copies whatever it needs out of the payload before the `async` block.
pub struct FnExecutor<F, P, R> {
    func: F,
    _marker: PhantomData<fn(&P) -> R>,
}

impl<F, P, R> FnExecutor<F, P, R> {
    /// Wrap a closure.
    pub fn new<Fut>(func: F) -> Self
    where
        F: Fn(&P, TaskMetadata) -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
    {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, P, R> TaskExecutor<P, R> for FnExecutor<F, P, R>
where
    F: Fn(&P, TaskMetadata) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    async fn execute(&self, payload: &P, meta: TaskMetadata) -> anyhow::Result<R> {
        (self.func)(payload, meta).await
    }
}
