//! Bounded-concurrency scheduler and its self-driving dispatch loop.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::stats::SchedulerCounters;
use crate::core::{
    AuditAction, AuditSink, CompletionBarrier, FailureObserver, PriorityPolicy, QueuedTask,
    RetryDecision, RetryPolicy, SchedulerError, SchedulerStats, Task, TaskExecutor, TaskMetadata,
};
use crate::infra::queue::{PendingQueue, Popped};
use crate::runtime::TokioSpawner;
use crate::util::clock::now_ms;
use crate::util::serde::TaskId;

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn a future that runs to completion in the background.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Spawner bound to the runtime the caller is running in, if there is one.
    ///
    /// Used when a scheduler is built without an explicit spawner.
    #[must_use]
    fn ambient() -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

/// Mutable bookkeeping, only ever touched under the state lock.
struct SchedulerState<P, R> {
    pending: PendingQueue<P, R>,
    running: usize,
    paused: bool,
    next_seq: u64,
}

impl<P, R> SchedulerState<P, R> {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn is_idle(&self) -> bool {
        self.running == 0 && self.pending.live_len() == 0
    }
}

/// Everything a scheduler is assembled from.
pub(crate) struct SchedulerParts<E, S> {
    pub concurrency_limit: usize,
    pub retry: RetryPolicy,
    pub priority: PriorityPolicy,
    pub executor: E,
    pub spawner: S,
    pub observer: Option<Arc<dyn FailureObserver>>,
    pub audit: Option<Box<dyn AuditSink>>,
}

struct Inner<P, R, E, S> {
    instance_id: Uuid,
    concurrency_limit: usize,
    state: Mutex<SchedulerState<P, R>>,
    barrier: CompletionBarrier,
    retry: RetryPolicy,
    executor: E,
    spawner: S,
    next_id: AtomicU64,
    counters: SchedulerCounters,
    observer: Option<Arc<dyn FailureObserver>>,
    audit: Option<Mutex<Box<dyn AuditSink>>>,
}

/// Runs at most `concurrency_limit` tasks at a time, highest priority first.
///
/// Cloning is cheap and yields a handle to the same scheduler. Independent
/// schedulers share no state.
///
/// ```rust,ignore
/// let scheduler = SchedulerBuilder::new()
///     .with_concurrency_limit(3)
///     .with_retry_limit(2)
///     .with_executor(my_executor)
///     .build()?;
///
/// let id = scheduler.submit(Task::new(job).with_priority(9));
/// scheduler.await_idle().await;
/// ```
pub struct Scheduler<P, R, E, S = TokioSpawner> {
    inner: Arc<Inner<P, R, E, S>>,
}

impl<P, R, E, S> Clone for Scheduler<P, R, E, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, R, E, S> Scheduler<P, R, E, S>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
    E: TaskExecutor<P, R>,
    S: Spawn + Send + Sync + 'static,
{
    /// Create a scheduler with no retries.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfiguration`] if `concurrency_limit` is 0.
    pub fn new(concurrency_limit: usize, executor: E, spawner: S) -> Result<Self, SchedulerError> {
        Self::from_parts(SchedulerParts {
            concurrency_limit,
            retry: RetryPolicy::default(),
            priority: PriorityPolicy::default(),
            executor,
            spawner,
            observer: None,
            audit: None,
        })
    }

    pub(crate) fn from_parts(parts: SchedulerParts<E, S>) -> Result<Self, SchedulerError> {
        if parts.concurrency_limit == 0 {
            return Err(SchedulerError::InvalidConfiguration(
                "concurrency_limit must be greater than 0".into(),
            ));
        }
        let instance_id = Uuid::new_v4();
        info!(
            scheduler = %instance_id,
            concurrency_limit = parts.concurrency_limit,
            retry_limit = parts.retry.limit(),
            "scheduler created"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                instance_id,
                concurrency_limit: parts.concurrency_limit,
                state: Mutex::new(SchedulerState {
                    pending: PendingQueue::new(parts.priority),
                    running: 0,
                    paused: false,
                    next_seq: 0,
                }),
                barrier: CompletionBarrier::new(),
                retry: parts.retry,
                executor: parts.executor,
                spawner: parts.spawner,
                next_id: AtomicU64::new(1),
                counters: SchedulerCounters::default(),
                observer: parts.observer,
                audit: parts.audit.map(Mutex::new),
            }),
        })
    }

    /// Queue a task and start it if a slot is free. Never blocks on running work.
    pub fn submit(&self, task: Task<P, R>) -> TaskId {
        let inner = &self.inner;
        let id = inner.next_id.fetch_add(1, Ordering::Relaxed);
        let meta = TaskMetadata {
            id,
            priority: task.priority,
            attempt: 1,
            created_at_ms: now_ms(),
        };
        SchedulerCounters::bump(&inner.counters.submitted);
        inner.record_audit(id, AuditAction::Submit, 1, None);
        {
            let mut state = inner.state.lock();
            let seq = state.next_seq();
            state.pending.push(QueuedTask { meta, seq, task });
            inner.barrier.publish(state.is_idle());
        }
        debug!(scheduler = %inner.instance_id, task_id = id, priority = %meta.priority, "task submitted");
        inner.dispatch();
        id
    }

    /// Stop starting new tasks. Running tasks finish normally.
    pub fn pause(&self) {
        let mut state = self.inner.state.lock();
        if !state.paused {
            state.paused = true;
            info!(scheduler = %self.inner.instance_id, "scheduler paused");
        }
    }

    /// Resume dispatch after [`pause`](Self::pause).
    pub fn resume(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.paused {
                state.paused = false;
                info!(scheduler = %self.inner.instance_id, "scheduler resumed");
            }
        }
        self.inner.dispatch();
    }

    /// Cancel a task that has not started yet.
    ///
    /// Returns `true` if a pending task (or one waiting out a retry backoff) was marked.
    /// Running, finished and unknown tasks are left alone.
    pub fn cancel(&self, id: TaskId) -> bool {
        let inner = &self.inner;
        let cancelled = {
            let mut state = inner.state.lock();
            let cancelled = state.pending.cancel(id);
            if cancelled {
                SchedulerCounters::bump(&inner.counters.cancelled);
                inner.barrier.publish(state.is_idle());
            }
            cancelled
        };
        if cancelled {
            inner.record_audit(id, AuditAction::Cancel, 0, None);
            info!(scheduler = %inner.instance_id, task_id = id, "task cancelled");
        } else {
            debug!(scheduler = %inner.instance_id, task_id = id, "cancel ignored: task not pending");
        }
        cancelled
    }

    /// Wait until nothing is pending and nothing is running.
    pub async fn await_idle(&self) {
        self.inner.barrier.wait().await;
    }

    /// [`await_idle`](Self::await_idle) bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Timeout`] if the scheduler did not become idle in time.
    pub async fn await_idle_timeout(&self, timeout: Duration) -> Result<(), SchedulerError> {
        tokio::time::timeout(timeout, self.await_idle())
            .await
            .map_err(|_| SchedulerError::Timeout)
    }

    /// Blocking variant of [`await_idle_timeout`](Self::await_idle_timeout) for
    /// synchronous callers. Do not call from an async worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Timeout`] if the scheduler did not become idle in time.
    pub fn wait_idle_blocking(&self, timeout: Duration) -> Result<(), SchedulerError> {
        let mut state = self.inner.state.lock();
        if self.inner.barrier.wait_blocking(&mut state, timeout) {
            Ok(())
        } else {
            Err(SchedulerError::Timeout)
        }
    }

    /// Whether the scheduler is currently quiescent.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.inner.state.lock().is_idle()
    }

    /// Whether dispatch is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.state.lock().paused
    }

    /// Tasks currently executing.
    #[must_use]
    pub fn running_count(&self) -> usize {
        self.inner.state.lock().running
    }

    /// Tasks waiting to run, excluding cancelled ones.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().pending.live_len()
    }

    /// Configured concurrency limit.
    #[must_use]
    pub fn concurrency_limit(&self) -> usize {
        self.inner.concurrency_limit
    }

    /// Unique id of this scheduler instance, used in log fields.
    #[must_use]
    pub fn instance_id(&self) -> Uuid {
        self.inner.instance_id
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let state = self.inner.state.lock();
        self.inner.counters.snapshot(
            self.inner.concurrency_limit,
            state.running,
            state.pending.live_len(),
            state.pending.parked_len(),
            state.paused,
        )
    }
}

impl<P, R, E, S> Inner<P, R, E, S>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
    E: TaskExecutor<P, R>,
    S: Spawn + Send + Sync + 'static,
{
    /// Fill every free slot with the best eligible pending task.
    fn dispatch(self: &Arc<Self>) {
        let mut admitted = Vec::new();
        let mut discarded = Vec::new();
        {
            let mut state = self.state.lock();
            while !state.paused && state.running < self.concurrency_limit {
                match state.pending.pop() {
                    None => break,
                    Some(Popped::Cancelled(entry)) => discarded.push(entry.meta.id),
                    Some(Popped::Ready(entry)) => {
                        state.running += 1;
                        admitted.push(entry);
                    }
                }
            }
            self.barrier.publish(state.is_idle());
        }
        for id in discarded {
            debug!(scheduler = %self.instance_id, task_id = id, "discarded cancelled task");
        }
        for entry in admitted {
            self.spawn_attempt(entry);
        }
    }

    fn spawn_attempt(self: &Arc<Self>, entry: QueuedTask<P, R>) {
        let meta = entry.meta;
        self.record_audit(meta.id, AuditAction::Start, meta.attempt, None);
        debug!(
            scheduler = %self.instance_id,
            task_id = meta.id,
            attempt = meta.attempt,
            "dispatching task"
        );

        let inner = Arc::clone(self);
        let guard = SlotGuard {
            inner: Arc::clone(self),
            task_id: meta.id,
            armed: true,
        };
        self.spawner.spawn(async move {
            // `execute` itself runs inside the unwind boundary: executors may panic
            // before returning a future.
            let attempt = async { inner.executor.execute(&entry.task.payload, meta).await };
            let outcome = AssertUnwindSafe(attempt).catch_unwind().await;
            guard.disarm();
            let outcome = match outcome {
                Ok(result) => result,
                Err(panic) => {
                    error!(task_id = meta.id, "worker panicked");
                    Err(anyhow::anyhow!("worker panicked: {}", panic_message(&*panic)))
                }
            };
            inner.finish(entry, outcome);
        });
    }

    /// React to the outcome of one attempt, then free its slot.
    fn finish(self: &Arc<Self>, entry: QueuedTask<P, R>, outcome: anyhow::Result<R>) {
        let meta = entry.meta;
        match outcome {
            Ok(result) => {
                let Task {
                    payload, callback, ..
                } = entry.task;
                if let Some(callback) = callback {
                    if panic::catch_unwind(AssertUnwindSafe(|| callback(payload, result))).is_err() {
                        error!(task_id = meta.id, "task callback panicked");
                    }
                }
                SchedulerCounters::bump(&self.counters.succeeded);
                self.record_audit(meta.id, AuditAction::Succeed, meta.attempt, None);
                debug!(scheduler = %self.instance_id, task_id = meta.id, attempt = meta.attempt, "task succeeded");
                self.release();
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(
                    scheduler = %self.instance_id,
                    task_id = meta.id,
                    attempt = meta.attempt,
                    error = %reason,
                    "task attempt failed"
                );
                SchedulerCounters::bump(&self.counters.failed_attempts);
                self.record_audit(meta.id, AuditAction::Fail, meta.attempt, Some(reason.clone()));
                let failure = SchedulerError::WorkerFailure {
                    task_id: meta.id,
                    attempt: meta.attempt,
                    reason: reason.clone(),
                };

                match self.retry.decide(meta.attempt, entry.task.retry_limit) {
                    RetryDecision::Retry { delay } => {
                        SchedulerCounters::bump(&self.counters.retried);
                        self.record_audit(meta.id, AuditAction::Retry, meta.attempt + 1, None);
                        debug!(
                            task_id = meta.id,
                            retries = entry.retry_count() + 1,
                            ?delay,
                            "retrying task"
                        );
                        // Queued before the observer runs, so the observer can cancel it.
                        self.readmit(entry, delay);
                        self.notify_observer(meta.id, &failure, meta.attempt);
                        self.release();
                    }
                    RetryDecision::Exhausted => {
                        self.notify_observer(meta.id, &failure, meta.attempt);
                        let exhausted = SchedulerError::RetriesExhausted {
                            task_id: meta.id,
                            attempts: meta.attempt,
                            last_error: reason,
                        };
                        warn!(scheduler = %self.instance_id, task_id = meta.id, "{exhausted}");
                        SchedulerCounters::bump(&self.counters.exhausted);
                        self.record_audit(
                            meta.id,
                            AuditAction::Exhaust,
                            meta.attempt,
                            Some(exhausted.to_string()),
                        );
                        self.notify_observer(meta.id, &exhausted, meta.attempt);
                        self.release();
                    }
                }
            }
        }
    }

    /// Queue the next attempt of a failed task while its slot is still held.
    ///
    /// With a delay the task is parked: it stays pending and cancellable until
    /// the backoff elapses.
    fn readmit(self: &Arc<Self>, entry: QueuedTask<P, R>, delay: Option<Duration>) {
        let Some(delay) = delay else {
            let mut state = self.state.lock();
            let seq = state.next_seq();
            state.pending.push(entry.into_retry(seq));
            return;
        };
        self.state.lock().pending.park(entry.meta.id);
        self.schedule_readmission(entry, delay);
    }

    /// Free one slot and dispatch.
    fn release(self: &Arc<Self>) {
        self.free_slot();
        self.dispatch();
    }

    /// Re-admit a parked retry once its backoff has elapsed.
    fn schedule_readmission(self: &Arc<Self>, entry: QueuedTask<P, R>, delay: Duration) {
        let inner = Arc::clone(self);
        self.spawner.spawn(async move {
            tokio::time::sleep(delay).await;
            let id = entry.meta.id;
            let admitted = {
                let mut state = inner.state.lock();
                let seq = state.next_seq();
                let admitted = state.pending.unpark(entry.into_retry(seq));
                inner.barrier.publish(state.is_idle());
                admitted
            };
            if !admitted {
                debug!(scheduler = %inner.instance_id, task_id = id, "dropped retry cancelled during backoff");
            }
            inner.dispatch();
        });
    }

    fn notify_observer(&self, task_id: TaskId, error: &SchedulerError, attempts: u32) {
        if let Some(observer) = self.observer.as_ref() {
            let call = AssertUnwindSafe(|| observer.on_failure(task_id, error, attempts));
            if panic::catch_unwind(call).is_err() {
                error!(task_id, "failure observer panicked");
            }
        }
    }

    /// Record an audit event (sync operation with parking_lot mutex).
    fn record_audit(&self, task_id: TaskId, action: AuditAction, attempt: u32, detail: Option<String>) {
        if let Some(audit_sink) = &self.audit {
            let event = crate::core::build_audit_event(
                self.instance_id.to_string(),
                task_id,
                action,
                attempt,
                detail,
            );
            audit_sink.lock().record(event);
        }
    }
}

impl<P, R, E, S> Inner<P, R, E, S> {
    fn free_slot(&self) {
        let mut state = self.state.lock();
        state.running = state.running.saturating_sub(1);
        self.barrier.publish(state.is_idle());
    }
}

/// Frees the slot of an attempt whose future is dropped before it reports an
/// outcome, e.g. when the runtime shuts down. Pending work is not dispatched from
/// here; the next submit, resume or completion picks it up.
struct SlotGuard<P, R, E, S> {
    inner: Arc<Inner<P, R, E, S>>,
    task_id: TaskId,
    armed: bool,
}

impl<P, R, E, S> SlotGuard<P, R, E, S> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<P, R, E, S> Drop for SlotGuard<P, R, E, S> {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                scheduler = %self.inner.instance_id,
                task_id = self.task_id,
                "attempt dropped before completion; slot released"
            );
            self.inner.free_slot();
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
