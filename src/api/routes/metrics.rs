//! Prometheus scrape endpoint

use axum::{extract::State, http::header, response::IntoResponse};
use prometheus::TEXT_FORMAT;

use crate::api::{ApiResult, ApiState};

/// GET /metrics
pub async fn render_metrics(State(state): State<ApiState>) -> ApiResult<impl IntoResponse> {
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, TEXT_FORMAT)], body))
}
