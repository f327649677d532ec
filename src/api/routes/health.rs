//! Liveness endpoint

use axum::extract::State;

use crate::api::{ApiResult, ApiState};

/// GET /ping
///
/// Answers `pong` while the database under test responds, 503 otherwise
pub async fn ping(State(state): State<ApiState>) -> ApiResult<&'static str> {
    state.backend.ping().await?;
    Ok("pong")
}
