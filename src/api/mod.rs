//! Metrics exporter for Prometheus style scrapers
//!
//! ## Endpoints
//!
//! - `GET /metrics` - request latency histogram and error counters
//! - `GET /ping` - liveness of the database under test

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;

use std::net::SocketAddr;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Routes served by the exporter
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/metrics", get(routes::metrics::render_metrics))
        .route("/ping", get(routes::health::ping))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Spawn the exporter
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_exporter(bind_addr: SocketAddr, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting metrics exporter on {}", bind_addr);

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("metrics exporter listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("metrics exporter error: {}", e);
        }
    });

    Ok(addr)
}
