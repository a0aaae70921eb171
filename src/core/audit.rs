//! Audit trail of task lifecycle transitions.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::util::clock::now_ms;
use crate::util::serde::TaskId;

/// Lifecycle transition recorded for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// Accepted by `submit`.
    Submit,
    /// Handed to the executor.
    Start,
    /// Attempt succeeded; callback fired.
    Succeed,
    /// Attempt failed.
    Fail,
    /// Re-admitted after a failure.
    Retry,
    /// Abandoned after the final failed attempt.
    Exhaust,
    /// Cancelled while pending.
    Cancel,
}

impl AuditAction {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Start => "start",
            Self::Succeed => "succeed",
            Self::Fail => "fail",
            Self::Retry => "retry",
            Self::Exhaust => "exhaust",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related task identifier.
    pub task_id: TaskId,
    /// Scheduler instance that produced the event.
    pub scheduler: String,
    /// Action taken.
    pub action: AuditAction,
    /// Attempt number the event refers to.
    pub attempt: u32,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context, such as an error message.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Bounded in-memory audit sink. Clones share the same buffer, so a caller can keep a
/// handle while the scheduler owns another.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Actions recorded for one task, oldest first.
    #[must_use]
    pub fn actions_for(&self, task_id: TaskId) -> Vec<AuditAction> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.task_id == task_id)
            .map(|e| e.action)
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    scheduler: impl Into<String>,
    task_id: TaskId,
    action: AuditAction,
    attempt: u32,
    detail: Option<String>,
) -> AuditEvent {
    let scheduler = scheduler.into();
    AuditEvent {
        event_id: format!("{scheduler}-{task_id}-{action}-{attempt}"),
        task_id,
        scheduler,
        action,
        attempt,
        created_at_ms: now_ms(),
        detail,
    }
}
