//! Tokio runtime spawner implementation.

use std::future::Future;

use tokio::runtime::Handle;

use crate::core::{SchedulerError, Spawn};

/// Tokio-based spawner that executes tasks on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    handle: Handle,
}

impl TokioSpawner {
    /// Create a spawner bound to a runtime handle.
    #[must_use]
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Create a spawner bound to the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfiguration`] when called outside a tokio runtime.
    pub fn current() -> Result<Self, SchedulerError> {
        Handle::try_current().map(Self::new).map_err(|e| {
            SchedulerError::InvalidConfiguration(format!("no tokio runtime available: {e}"))
        })
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Detached: completion is observed through the scheduler's own bookkeeping.
        drop(self.handle.spawn(fut));
    }

    fn ambient() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}
