//! Tests for builder modules

use prometheus_task_scheduler::builders::SchedulerBuilder;
use prometheus_task_scheduler::config::{BackoffConfig, RetryConfig, SchedulerConfig};
use prometheus_task_scheduler::core::{
    Backoff, FnExecutor, RetryOrdering, SchedulerError, Task, TaskMetadata,
};
use prometheus_task_scheduler::runtime::TokioSpawner;
use prometheus_task_scheduler::util::Priority;
use std::future::Ready;
use std::time::Duration;

type Doubler = FnExecutor<fn(&u32, TaskMetadata) -> Ready<anyhow::Result<u32>>, u32, u32>;

fn doubler() -> Doubler {
    fn double(n: &u32, _meta: TaskMetadata) -> Ready<anyhow::Result<u32>> {
        std::future::ready(Ok(n * 2))
    }
    FnExecutor::new(double as fn(&u32, TaskMetadata) -> Ready<anyhow::Result<u32>>)
}

#[test]
fn test_scheduler_builder_from_config() {
    let config = SchedulerConfig {
        concurrency_limit: 5,
        retry: RetryConfig {
            limit: 3,
            backoff: BackoffConfig::Fixed { delay_ms: 20 },
            ordering: RetryOrdering::Last,
        },
    };

    let builder = SchedulerBuilder::<Doubler>::from_config(&config);
    assert_eq!(builder.concurrency_limit(), 5);
    assert_eq!(builder.retry_policy().limit(), 3);
    assert_eq!(
        builder.retry_policy().backoff(),
        Backoff::Fixed(Duration::from_millis(20))
    );
}

#[test]
fn test_scheduler_builder_overrides_keep_backoff() {
    let builder = SchedulerBuilder::<Doubler>::new()
        .with_backoff(Backoff::Fixed(Duration::from_millis(5)))
        .with_retry_limit(4)
        .with_concurrency_limit(2);
    assert_eq!(builder.concurrency_limit(), 2);
    assert_eq!(builder.retry_policy().limit(), 4);
    assert_eq!(
        builder.retry_policy().backoff(),
        Backoff::Fixed(Duration::from_millis(5))
    );
}

#[test]
fn test_scheduler_builder_priority_default() {
    let priority = SchedulerBuilder::<Doubler, TokioSpawner>::default_priority();
    assert_eq!(priority, Priority::DEFAULT);
}

#[test]
fn test_scheduler_builder_explicit_spawner_outside_runtime() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");

    let scheduler = SchedulerBuilder::new()
        .with_concurrency_limit(2)
        .with_executor(doubler())
        .with_spawner(TokioSpawner::new(runtime.handle().clone()))
        .build::<u32, u32>()
        .expect("explicit spawner needs no ambient runtime");
    assert_eq!(scheduler.concurrency_limit(), 2);

    let (tx, rx) = std::sync::mpsc::channel();
    scheduler.submit(Task::new(21).with_callback(move |_n, doubled| {
        tx.send(doubled).unwrap();
    }));
    runtime.block_on(scheduler.await_idle());
    assert_eq!(rx.recv().unwrap(), 42);
}

#[test]
fn test_scheduler_builder_rejects_invalid_config() {
    let config = SchedulerConfig {
        concurrency_limit: 0,
        retry: RetryConfig::default(),
    };
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let result = SchedulerBuilder::from_config(&config)
        .with_executor(doubler())
        .with_spawner(TokioSpawner::new(runtime.handle().clone()))
        .build::<u32, u32>();
    assert!(matches!(result, Err(SchedulerError::InvalidConfiguration(_))));
}

#[test]
fn test_scheduler_builder_rejects_inverted_backoff() {
    let config = SchedulerConfig {
        concurrency_limit: 2,
        retry: RetryConfig {
            limit: 1,
            backoff: BackoffConfig::Exponential {
                base_ms: 100,
                max_ms: 10,
            },
            ordering: RetryOrdering::Requeue,
        },
    };
    let runtime = tokio::runtime::Runtime::new().expect("runtime");

    let from_config = SchedulerBuilder::from_config(&config)
        .with_executor(doubler())
        .with_spawner(TokioSpawner::new(runtime.handle().clone()))
        .build::<u32, u32>();
    assert!(matches!(
        from_config,
        Err(SchedulerError::InvalidConfiguration(msg)) if msg.contains("exceeds max")
    ));

    let fluent = SchedulerBuilder::new()
        .with_backoff(Backoff::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_millis(10),
        })
        .with_executor(doubler())
        .with_spawner(TokioSpawner::new(runtime.handle().clone()))
        .build::<u32, u32>();
    assert!(matches!(fluent, Err(SchedulerError::InvalidConfiguration(_))));
}
