//! Dispatch ordering among pending tasks.
//!
//! Highest priority value wins; among equal priorities the earliest admission wins.
//! The pending queue is a max-heap over [`DispatchKey`], which yields exactly the
//! order a stable descending sort of the pending list would.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::TaskMetadata;
use crate::util::serde::Priority;

/// Where a retried task re-enters the pending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryOrdering {
    /// Re-enter at the original priority, behind peers of equal priority already queued.
    #[default]
    Requeue,
    /// Re-enter behind every first-attempt task, whatever its priority.
    Last,
}

/// Sort key for a pending entry. Larger keys are dispatched first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DispatchKey {
    tier: u8,
    priority: Priority,
    seq: Reverse<u64>,
}

/// Total order used to pick the next task among pending ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityPolicy {
    retry_ordering: RetryOrdering,
}

impl PriorityPolicy {
    /// Create a policy with the given placement for retried tasks.
    #[must_use]
    pub const fn new(retry_ordering: RetryOrdering) -> Self {
        Self { retry_ordering }
    }

    /// Placement applied to retried tasks.
    #[must_use]
    pub const fn retry_ordering(&self) -> RetryOrdering {
        self.retry_ordering
    }

    /// Compute the dispatch key for an admission with sequence number `seq`.
    #[must_use]
    pub const fn key(&self, meta: &TaskMetadata, seq: u64) -> DispatchKey {
        let demoted = meta.attempt > 1 && matches!(self.retry_ordering, RetryOrdering::Last);
        DispatchKey {
            tier: if demoted { 0 } else { 1 },
            priority: meta.priority,
            seq: Reverse(seq),
        }
    }
}
