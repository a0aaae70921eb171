//! Tests for configuration validation

use prometheus_task_scheduler::config::{
    BackoffConfig, RetryConfig, SchedulerConfig, ENV_CONCURRENCY_LIMIT, ENV_RETRY_BACKOFF_MS,
    ENV_RETRY_LIMIT,
};
use prometheus_task_scheduler::core::{Backoff, RetryOrdering};
use std::time::Duration;

#[test]
fn test_scheduler_config_validation() {
    let valid = SchedulerConfig {
        concurrency_limit: 4,
        retry: RetryConfig {
            limit: 2,
            backoff: BackoffConfig::Exponential {
                base_ms: 10,
                max_ms: 100,
            },
            ordering: RetryOrdering::Requeue,
        },
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_scheduler_config_zero_concurrency() {
    let invalid = SchedulerConfig {
        concurrency_limit: 0,
        retry: RetryConfig::default(),
    };
    let err = invalid.validate().unwrap_err();
    assert!(err.contains("concurrency_limit"));
}

#[test]
fn test_scheduler_config_inverted_backoff() {
    let invalid = SchedulerConfig {
        concurrency_limit: 1,
        retry: RetryConfig {
            backoff: BackoffConfig::Exponential {
                base_ms: 500,
                max_ms: 100,
            },
            ..RetryConfig::default()
        },
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "concurrency_limit": 3,
        "retry": {
            "limit": 2,
            "backoff": { "kind": "fixed", "delay_ms": 50 },
            "ordering": "last"
        }
    }"#;

    let config = SchedulerConfig::from_json_str(json).expect("valid config");
    assert_eq!(config.concurrency_limit, 3);
    assert_eq!(config.retry.limit, 2);
    assert_eq!(config.retry.ordering, RetryOrdering::Last);

    let policy = config.retry.policy();
    assert_eq!(policy.limit(), 2);
    assert_eq!(policy.backoff(), Backoff::Fixed(Duration::from_millis(50)));
}

#[test]
fn test_scheduler_config_json_defaults_retry() {
    let config = SchedulerConfig::from_json_str(r#"{ "concurrency_limit": 2 }"#)
        .expect("valid config");
    assert_eq!(config.retry, RetryConfig::default());
    assert_eq!(config.retry.backoff, BackoffConfig::None);
}

#[test]
fn test_scheduler_config_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str(r#"{ "concurrency_limit": 0 }"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_scheduler_config_round_trips_through_json() {
    let config = SchedulerConfig {
        concurrency_limit: 8,
        retry: RetryConfig {
            limit: 1,
            backoff: BackoffConfig::Fixed { delay_ms: 5 },
            ordering: RetryOrdering::Requeue,
        },
    };
    let json = serde_json::to_string(&config).expect("serializes");
    assert_eq!(SchedulerConfig::from_json_str(&json), Ok(config));
}

// The only test touching these variables, so parallel tests cannot interfere.
#[test]
fn test_scheduler_config_from_env() {
    std::env::set_var(ENV_CONCURRENCY_LIMIT, "6");
    std::env::set_var(ENV_RETRY_LIMIT, "2");
    std::env::set_var(ENV_RETRY_BACKOFF_MS, "15");
    let config = SchedulerConfig::from_env();

    std::env::set_var(ENV_CONCURRENCY_LIMIT, "many");
    let bad = SchedulerConfig::from_env();

    std::env::remove_var(ENV_CONCURRENCY_LIMIT);
    std::env::remove_var(ENV_RETRY_LIMIT);
    std::env::remove_var(ENV_RETRY_BACKOFF_MS);

    let config = config.expect("valid environment");
    assert_eq!(config.concurrency_limit, 6);
    assert_eq!(config.retry.limit, 2);
    assert_eq!(config.retry.backoff, BackoffConfig::Fixed { delay_ms: 15 });

    let err = bad.unwrap_err();
    assert!(err.contains(ENV_CONCURRENCY_LIMIT));
}
