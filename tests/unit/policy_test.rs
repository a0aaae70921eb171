//! Tests for priority and retry policies

use prometheus_task_scheduler::core::{
    Backoff, PriorityPolicy, RetryDecision, RetryOrdering, RetryPolicy, TaskMetadata,
};
use prometheus_task_scheduler::util::Priority;
use std::time::Duration;

fn meta(priority: i32, attempt: u32) -> TaskMetadata {
    TaskMetadata {
        id: 1,
        priority: Priority(priority),
        attempt,
        created_at_ms: 0,
    }
}

#[test]
fn test_higher_priority_ranks_first() {
    let policy = PriorityPolicy::default();
    assert!(policy.key(&meta(5, 1), 10) > policy.key(&meta(1, 1), 1));
}

#[test]
fn test_earlier_admission_ranks_first() {
    let policy = PriorityPolicy::default();
    assert!(policy.key(&meta(1, 1), 1) > policy.key(&meta(1, 1), 2));
}

#[test]
fn test_requeue_keeps_retry_priority() {
    let policy = PriorityPolicy::new(RetryOrdering::Requeue);
    assert!(policy.key(&meta(9, 2), 50) > policy.key(&meta(0, 1), 1));
}

#[test]
fn test_last_ordering_demotes_retries() {
    let policy = PriorityPolicy::new(RetryOrdering::Last);
    assert_eq!(policy.retry_ordering(), RetryOrdering::Last);
    assert!(policy.key(&meta(0, 1), 50) > policy.key(&meta(9, 2), 1));
}

#[test]
fn test_retry_policy_budget() {
    let policy = RetryPolicy::new(2);
    assert_eq!(policy.decide(1, None), RetryDecision::Retry { delay: None });
    assert_eq!(policy.decide(2, None), RetryDecision::Retry { delay: None });
    assert_eq!(policy.decide(3, None), RetryDecision::Exhausted);
}

#[test]
fn test_retry_policy_task_override() {
    let policy = RetryPolicy::new(0);
    assert_eq!(policy.decide(1, None), RetryDecision::Exhausted);
    assert_eq!(
        policy.decide(1, Some(1)),
        RetryDecision::Retry { delay: None }
    );
    assert_eq!(policy.decide(2, Some(1)), RetryDecision::Exhausted);
}

#[test]
fn test_exponential_backoff_is_capped() {
    let backoff = Backoff::Exponential {
        base: Duration::from_millis(10),
        max: Duration::from_millis(35),
    };
    let policy = RetryPolicy::new(5).with_backoff(backoff);
    let delays: Vec<_> = (1..=4)
        .map(|attempt| match policy.decide(attempt, None) {
            RetryDecision::Retry { delay } => delay,
            RetryDecision::Exhausted => panic!("budget not spent"),
        })
        .collect();
    assert_eq!(
        delays,
        vec![
            Some(Duration::from_millis(10)),
            Some(Duration::from_millis(20)),
            Some(Duration::from_millis(35)),
            Some(Duration::from_millis(35)),
        ]
    );
}
