//! Integration tests for the metrics exporter
//!
//! These tests verify that:
//! - `/metrics` exposes the latency histogram and error counter
//! - `/ping` follows the health of the backend

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use db_benchmark::{
    Backend, MetricsRegistry,
    api::{ApiState, spawn_exporter},
    backend::memory::MemoryBackend,
};

use crate::helpers::*;

async fn spawn_test_exporter(
    metrics: Arc<MetricsRegistry>,
    backend: Arc<dyn Backend>,
) -> SocketAddr {
    let state = ApiState::new(metrics, backend);
    spawn_exporter("127.0.0.1:0".parse().unwrap(), state)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_both_instruments() {
    let metrics = create_metrics();
    let backend = Arc::new(MemoryBackend::new(metrics.clone()));

    backend.insert("a").await.unwrap();
    backend.insert("b").await.unwrap();
    assert!(backend.insert("a").await.is_err());

    let addr = spawn_test_exporter(metrics, backend).await;
    let response = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = response.text().await.unwrap();
    assert!(body.contains("database_request_duration_seconds_bucket"));
    assert!(body.contains("database_request_duration_seconds_count{query=\"add\"} 2"));
    assert!(body.contains("database_error_requests{method=\"add\"} 1"));
}

#[tokio::test]
async fn test_ping_follows_backend_health() {
    let backend = Arc::new(CountingBackend::new());
    let addr = spawn_test_exporter(create_metrics(), backend.clone()).await;
    let url = format!("http://{addr}/ping");

    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "pong");

    backend.set_failing(true);
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let addr = spawn_test_exporter(create_metrics(), Arc::new(CountingBackend::new())).await;

    let response = reqwest::get(format!("http://{addr}/servers")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
