//! In-memory pending queue with priority ordering and cancellation marks.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::core::{DispatchKey, PriorityPolicy, QueuedTask};
use crate::util::serde::TaskId;

/// Heap wrapper ordering entries by their precomputed dispatch key.
struct HeapEntry<P, R> {
    key: DispatchKey,
    task: QueuedTask<P, R>,
}

impl<P, R> PartialEq for HeapEntry<P, R> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<P, R> Eq for HeapEntry<P, R> {}

impl<P, R> PartialOrd for HeapEntry<P, R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P, R> Ord for HeapEntry<P, R> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Result of taking the next entry off the queue.
pub enum Popped<P, R> {
    /// Entry eligible for dispatch.
    Ready(QueuedTask<P, R>),
    /// Entry that was cancelled while pending; it must be discarded.
    Cancelled(QueuedTask<P, R>),
}

/// Pending tasks awaiting dispatch.
///
/// Tasks waiting out a retry backoff are "parked": they are members of the queue
/// (cancellable, counted as pending) but not yet in the heap.
pub struct PendingQueue<P, R> {
    policy: PriorityPolicy,
    /// O(log n) push and pop.
    heap: BinaryHeap<HeapEntry<P, R>>,
    /// Ids currently queued or parked.
    members: HashSet<TaskId>,
    parked: HashSet<TaskId>,
    /// Members marked cancelled but not yet discarded.
    cancelled: HashSet<TaskId>,
}

impl<P, R> PendingQueue<P, R> {
    /// Create an empty queue ordered by `policy`.
    pub fn new(policy: PriorityPolicy) -> Self {
        Self {
            policy,
            heap: BinaryHeap::new(),
            members: HashSet::new(),
            parked: HashSet::new(),
            cancelled: HashSet::new(),
        }
    }

    /// Insert an entry in dispatch order.
    pub fn push(&mut self, task: QueuedTask<P, R>) {
        let key = self.policy.key(&task.meta, task.seq);
        self.members.insert(task.meta.id);
        self.heap.push(HeapEntry { key, task });
    }

    /// Register a task that will be pushed later, once its backoff expires.
    pub fn park(&mut self, id: TaskId) {
        self.members.insert(id);
        self.parked.insert(id);
    }

    /// Move a parked task into the heap.
    ///
    /// Returns `false` if it was cancelled while parked; the entry is then dropped.
    pub fn unpark(&mut self, task: QueuedTask<P, R>) -> bool {
        let id = task.meta.id;
        self.parked.remove(&id);
        if self.cancelled.remove(&id) {
            self.members.remove(&id);
            return false;
        }
        self.push(task);
        true
    }

    /// Mark a queued or parked task cancelled. Returns `false` if `id` is not pending
    /// or was already cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.members.contains(&id) && self.cancelled.insert(id)
    }

    /// Take the highest-ranked entry.
    pub fn pop(&mut self) -> Option<Popped<P, R>> {
        let entry = self.heap.pop()?;
        let id = entry.task.meta.id;
        self.members.remove(&id);
        if self.cancelled.remove(&id) {
            Some(Popped::Cancelled(entry.task))
        } else {
            Some(Popped::Ready(entry.task))
        }
    }

    /// Pending tasks that may still run: queued or parked, and not cancelled.
    pub fn live_len(&self) -> usize {
        self.members.len().saturating_sub(self.cancelled.len())
    }

    /// Entries in the heap, cancelled ones included.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the heap holds no entries.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Tasks currently waiting out a retry backoff.
    pub fn parked_len(&self) -> usize {
        self.parked.len()
    }

    /// Whether `id` is queued or parked and not cancelled.
    pub fn contains_live(&self, id: TaskId) -> bool {
        self.members.contains(&id) && !self.cancelled.contains(&id)
    }
}
