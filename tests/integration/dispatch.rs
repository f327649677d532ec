//! Dispatcher behaviour against counting and in-memory backends
//!
//! These tests verify that:
//! - Every enqueued job produces exactly one completion
//! - Tokens are never lost or duplicated across workers
//! - Concurrency never exceeds the worker count
//! - Failing inserts still complete and are counted
//! - Shutdown stops a run early

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use db_benchmark::{Backend, Dispatcher, Operation, backend::memory::MemoryBackend};
use pretty_assertions::assert_eq;

use crate::helpers::*;

#[tokio::test]
async fn test_pool_of_three_runs_ten_inserts() {
    let backend = Arc::new(CountingBackend::new());
    let dispatcher = Dispatcher::new(backend.clone(), 3, 10);

    let report = dispatcher.run().await;

    assert_eq!(report.enqueued, 10);
    assert_eq!(report.completed, 10);
    assert_eq!(report.failed, 0);
    assert!(!report.cancelled);
    assert_eq!(backend.inserts(), 10);
    assert_eq!(backend.distinct_keys().await, 10);
    assert_eq!(backend.duplicates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrency_bounded_by_pool_size() {
    let backend = Arc::new(CountingBackend::with_delay(Duration::from_millis(5)));
    let dispatcher = Dispatcher::new(backend.clone(), 4, 40);

    let report = dispatcher.run().await;

    assert_eq!(report.completed, 40);
    let peak = backend.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 4, "{peak} inserts ran at once with 4 workers");
    assert!(peak >= 1);
}

#[tokio::test]
async fn test_single_worker_runs_sequentially() {
    let backend = Arc::new(CountingBackend::with_delay(Duration::from_millis(1)));
    let dispatcher = Dispatcher::new(backend.clone(), 1, 15);

    let report = dispatcher.run().await;

    assert_eq!(report.completed, 15);
    assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failing_backend_still_completes_every_job() {
    let backend = Arc::new(CountingBackend::new());
    backend.set_failing(true);
    let dispatcher = Dispatcher::new(backend.clone(), 2, 12);

    let report = dispatcher.run().await;

    assert_eq!(report.completed, 12);
    assert_eq!(report.failed, 12);
    assert_eq!(report.succeeded(), 0);
    assert_eq!(backend.distinct_keys().await, 0);
}

#[tokio::test]
async fn test_memory_backend_counts_every_insert() {
    let metrics = create_metrics();
    let backend = Arc::new(MemoryBackend::new(metrics.clone()));
    let dispatcher = Dispatcher::new(backend.clone(), 5, 250);

    let report = dispatcher.run().await;

    assert_eq!(report.completed, 250);
    assert_eq!(report.failed, 0);
    assert_eq!(backend.len().await, 250);
    assert_eq!(metrics.observations(Operation::Add), 250);
    assert_eq!(metrics.errors(Operation::Add), 0);
}

#[tokio::test]
async fn test_memory_backend_going_offline_mid_run() {
    let metrics = create_metrics();
    let backend = Arc::new(MemoryBackend::new(metrics.clone()));
    backend.set_online(false);

    let report = Dispatcher::new(backend.clone(), 3, 20).run().await;

    assert_eq!(report.completed, 20);
    assert_eq!(report.failed, 20);
    assert_eq!(metrics.errors(Operation::Add), 20);
    assert_eq!(metrics.observations(Operation::Add), 0);
    assert!(backend.ping().await.is_err());
}

#[tokio::test]
async fn test_shutdown_stops_long_run() {
    let backend = Arc::new(CountingBackend::with_delay(Duration::from_millis(10)));
    let dispatcher = Dispatcher::new(backend.clone(), 2, 10_000);

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        dispatcher.run_until(tokio::time::sleep(Duration::from_millis(50))),
    )
    .await
    .expect("dispatcher did not stop after shutdown");

    assert!(report.cancelled);
    assert!(report.completed < 10_000);
    assert!(report.completed <= report.enqueued);
    assert_eq!(backend.inserts(), report.completed);
}

#[tokio::test]
async fn test_zero_jobs_returns_immediately() {
    let backend = Arc::new(CountingBackend::new());
    let dispatcher = Dispatcher::new(backend.clone(), 4, 0);

    let report = tokio::time::timeout(Duration::from_secs(5), dispatcher.run())
        .await
        .expect("dispatcher hung on an empty run");

    assert_eq!(report.enqueued, 0);
    assert_eq!(report.completed, 0);
    assert_eq!(backend.inserts(), 0);
}
