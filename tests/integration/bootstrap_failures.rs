//! Fatal bootstrap paths
//!
//! Each failure must name the stage that broke and leave nothing running.

use assert_matches::assert_matches;
use db_benchmark::{BootstrapError, ConnectionParameters, Engine, backend::BootstrapStage, bootstrap};
use tempfile::tempdir;

use crate::helpers::*;

#[tokio::test]
async fn test_unreachable_mysql_fails_before_migrating() {
    let mut params = ConnectionParameters::new(Engine::Mysql);
    params.host = "127.0.0.1".to_string();
    params.port = Some(1);
    params.database = "bench".to_string();
    params.connect_timeout_secs = 1;

    let err = bootstrap::connect(params, create_metrics()).await.err().unwrap();

    assert_matches!(
        err,
        BootstrapError {
            stage: BootstrapStage::Connect | BootstrapStage::Ping,
            ..
        }
    );
}

#[tokio::test]
async fn test_missing_migrations_fail_at_migrate_stage() {
    let temp_dir = tempdir().unwrap();
    let mut params = sqlite_params(&temp_dir.path().join("bench.db"), 2);
    params.migrations_dir = temp_dir.path().join("does-not-exist");

    let err = bootstrap::connect(params, create_metrics()).await.err().unwrap();

    assert_eq!(err.stage, BootstrapStage::Migrate);
    assert!(err.to_string().contains("migrat"));
}

#[tokio::test]
async fn test_sqlite_without_file_fails_validation() {
    let params = ConnectionParameters::new(Engine::Sqlite);

    let err = bootstrap::connect(params, create_metrics()).await.err().unwrap();

    assert_eq!(err.stage, BootstrapStage::Configure);
}
