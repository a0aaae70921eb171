//! Infrastructure adapters backing the scheduler's bookkeeping.

pub mod queue;
pub use queue::PendingQueue;
