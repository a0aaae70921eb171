//! Scheduler configuration structures.

use std::env::{self, VarError};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Backoff, RetryOrdering, RetryPolicy};

/// Environment variable holding the concurrency limit.
pub const ENV_CONCURRENCY_LIMIT: &str = "SCHEDULER_CONCURRENCY_LIMIT";
/// Environment variable holding the scheduler-wide retry limit.
pub const ENV_RETRY_LIMIT: &str = "SCHEDULER_RETRY_LIMIT";
/// Environment variable holding a fixed retry backoff in milliseconds.
pub const ENV_RETRY_BACKOFF_MS: &str = "SCHEDULER_RETRY_BACKOFF_MS";

/// Delay schedule between a failure and the retry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffConfig {
    /// Retry immediately.
    #[default]
    None,
    /// Constant delay.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Doubling delay with an upper bound.
    Exponential {
        /// First delay in milliseconds.
        base_ms: u64,
        /// Maximum delay in milliseconds.
        max_ms: u64,
    },
}

impl BackoffConfig {
    /// Convert to the runtime representation.
    #[must_use]
    pub const fn to_backoff(self) -> Backoff {
        match self {
            Self::None => Backoff::None,
            Self::Fixed { delay_ms } => Backoff::Fixed(Duration::from_millis(delay_ms)),
            Self::Exponential { base_ms, max_ms } => Backoff::Exponential {
                base: Duration::from_millis(base_ms),
                max: Duration::from_millis(max_ms),
            },
        }
    }
}

/// Retry behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries allowed per task; 0 disables retrying.
    #[serde(default)]
    pub limit: u32,
    /// Delay before a retry re-enters the queue.
    #[serde(default)]
    pub backoff: BackoffConfig,
    /// Where retries re-enter the dispatch order.
    #[serde(default)]
    pub ordering: RetryOrdering,
}

impl RetryConfig {
    /// Build the retry policy described by this config.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.limit).with_backoff(self.backoff.to_backoff())
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum tasks in flight.
    pub concurrency_limit: usize,
    /// Retry behaviour.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SchedulerConfig {
    /// One slot per logical CPU, no retries.
    fn default() -> Self {
        Self {
            concurrency_limit: num_cpus::get().max(1),
            retry: RetryConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values. Invalid values are rejected, never clamped.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency_limit == 0 {
            return Err("concurrency_limit must be greater than 0".into());
        }
        self.retry.backoff.to_backoff().validate()
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the environment, loading a `.env` file first if present.
    ///
    /// Unset variables keep their [`Default`] values.
    ///
    /// # Errors
    ///
    /// Returns a message naming the variable that failed to parse or validate.
    pub fn from_env() -> Result<Self, String> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(format!(".env error: {e}"));
            }
        }
        let mut cfg = Self::default();
        if let Some(limit) = read_var(ENV_CONCURRENCY_LIMIT)? {
            cfg.concurrency_limit = limit;
        }
        if let Some(limit) = read_var(ENV_RETRY_LIMIT)? {
            cfg.retry.limit = limit;
        }
        if let Some(delay_ms) = read_var(ENV_RETRY_BACKOFF_MS)? {
            cfg.retry.backoff = BackoffConfig::Fixed { delay_ms };
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn read_var<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("{name}: {e}")),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(format!("{name}: {e}")),
    }
}
