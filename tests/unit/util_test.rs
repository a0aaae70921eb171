//! Tests for utility functions

use prometheus_task_scheduler::util::{now_ms, Priority, TaskId};

#[test]
fn test_priority_ordering() {
    assert!(Priority::CRITICAL > Priority::HIGH);
    assert!(Priority::HIGH > Priority::DEFAULT);
    assert!(Priority::DEFAULT > Priority::LOW);
    assert!(Priority::LOW > Priority(-1));
}

#[test]
fn test_priority_default_and_conversion() {
    assert_eq!(Priority::default(), Priority::DEFAULT);
    assert_eq!(Priority::from(7).value(), 7);
    assert_eq!(Priority(3).to_string(), "3");
}

#[test]
fn test_priority_serializes_as_number() {
    assert_eq!(serde_json::to_string(&Priority(5)).unwrap(), "5");
    let parsed: Priority = serde_json::from_str("-2").unwrap();
    assert_eq!(parsed, Priority(-2));
}

#[test]
fn test_task_id() {
    let id: TaskId = 12345;
    assert_eq!(id, 12345);
}

#[test]
fn test_clock_advances() {
    let a = now_ms();
    let b = now_ms();
    assert!(a > 0);
    assert!(b >= a);
}
