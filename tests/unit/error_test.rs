//! Tests for error types

use prometheus_task_scheduler::core::SchedulerError;

#[test]
fn test_worker_failure_error() {
    let err = SchedulerError::WorkerFailure {
        task_id: 3,
        attempt: 2,
        reason: "connection reset".to_string(),
    };
    assert_eq!(
        format!("{err}"),
        "task 3 attempt 2 failed: connection reset"
    );
    assert_eq!(err.task_id(), Some(3));
}

#[test]
fn test_retries_exhausted_error() {
    let err = SchedulerError::RetriesExhausted {
        task_id: 9,
        attempts: 3,
        last_error: "timeout".to_string(),
    };
    assert_eq!(
        format!("{err}"),
        "task 9 abandoned after 3 attempts: timeout"
    );
    assert_eq!(err.task_id(), Some(9));
}

#[test]
fn test_invalid_configuration_error() {
    let err = SchedulerError::InvalidConfiguration("concurrency_limit must be greater than 0".into());
    assert_eq!(
        format!("{err}"),
        "invalid configuration: concurrency_limit must be greater than 0"
    );
    assert_eq!(err.task_id(), None);
}

#[test]
fn test_timeout_error() {
    let err = SchedulerError::Timeout;
    assert_eq!(
        format!("{err}"),
        "timed out waiting for scheduler to become idle"
    );
}

#[test]
fn test_error_converts_to_anyhow() {
    let result: prometheus_task_scheduler::core::AppResult<()> =
        Err(SchedulerError::Timeout.into());
    let err = result.unwrap_err();
    assert_eq!(
        err.downcast_ref::<SchedulerError>(),
        Some(&SchedulerError::Timeout)
    );
}
