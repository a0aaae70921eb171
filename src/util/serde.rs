//! Serializable identifier and priority types shared across the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scheduler-assigned task identifier, unique within one scheduler instance.
pub type TaskId = u64;

/// Numeric task priority. Higher values are dispatched first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    /// Background work.
    pub const LOW: Self = Self(0);
    /// Priority assigned when the caller does not choose one.
    pub const DEFAULT: Self = Self(1);
    /// Work that should overtake default traffic.
    pub const HIGH: Self = Self(5);
    /// Work that should overtake everything else.
    pub const CRITICAL: Self = Self(9);

    /// Raw numeric value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
