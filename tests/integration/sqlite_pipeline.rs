//! End-to-end runs against an embedded SQLite database
//!
//! These tests verify that:
//! - Bootstrap opens, pings and migrates a fresh database file
//! - A dispatched run writes one row per job
//! - Latency and error metrics line up with the rows written

use std::sync::Arc;

use db_benchmark::{Backend, Dispatcher, Operation, bootstrap};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use crate::helpers::*;

async fn count_rows(db_file: &std::path::Path) -> i64 {
    let pool = sqlx::SqlitePool::connect(&format!("sqlite://{}", db_file.display()))
        .await
        .unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    pool.close().await;
    count
}

#[tokio::test]
async fn test_bootstrap_then_dispatch_writes_every_row() {
    let temp_dir = tempdir().unwrap();
    let db_file = temp_dir.path().join("bench.db");
    let metrics = create_metrics();

    let database = bootstrap::connect(sqlite_params(&db_file, 4), metrics.clone())
        .await
        .unwrap();
    let backend: Arc<dyn Backend> = Arc::new(database);

    let report = Dispatcher::new(backend.clone(), 4, 100).run().await;

    assert_eq!(report.completed, 100);
    assert_eq!(report.failed, 0);
    assert_eq!(metrics.observations(Operation::Add), 100);
    assert_eq!(metrics.errors(Operation::Add), 0);

    backend.close().await;
    assert_eq!(count_rows(&db_file).await, 100);
}

#[tokio::test]
async fn test_second_bootstrap_keeps_existing_rows() {
    let temp_dir = tempdir().unwrap();
    let db_file = temp_dir.path().join("bench.db");
    let metrics = create_metrics();

    let first = bootstrap::connect(sqlite_params(&db_file, 2), metrics.clone())
        .await
        .unwrap();
    first.insert("first-run").await.unwrap();
    first.close().await;

    let second = bootstrap::connect(sqlite_params(&db_file, 2), create_metrics())
        .await
        .unwrap();
    assert_eq!(second.get("first-run").await.unwrap(), "first-run");
    second.close().await;
}

#[tokio::test]
async fn test_duplicate_key_counts_one_add_error() {
    let temp_dir = tempdir().unwrap();
    let db_file = temp_dir.path().join("bench.db");
    let metrics = create_metrics();

    let database = bootstrap::connect(sqlite_params(&db_file, 1), metrics.clone())
        .await
        .unwrap();

    database.insert("same-key").await.unwrap();
    assert_eq!(metrics.observations(Operation::Add), 1);

    assert!(database.insert("same-key").await.is_err());
    assert_eq!(metrics.errors(Operation::Add), 1);
    assert_eq!(metrics.observations(Operation::Add), 1);

    database.close().await;
}

#[tokio::test]
async fn test_lookup_of_missing_key_counts_get_error() {
    let temp_dir = tempdir().unwrap();
    let db_file = temp_dir.path().join("bench.db");
    let metrics = create_metrics();

    let database = bootstrap::connect(sqlite_params(&db_file, 1), metrics.clone())
        .await
        .unwrap();

    assert!(database.get("never-inserted").await.is_err());
    assert_eq!(metrics.errors(Operation::Get), 1);
    assert_eq!(metrics.observations(Operation::Get), 0);
    assert_eq!(metrics.errors(Operation::Add), 0);

    database.close().await;
}
