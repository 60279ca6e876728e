use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use tracing::debug;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

/// Handler: GET /rag/status
///
/// Always answers 200; availability of the index is reported inside the
/// payload.
pub async fn rag_status_route(State(state): State<Arc<AppState>>) -> Response {
    let status = state.service.status().await;
    debug!(available = status.available, "rag_status_route");
    ApiResponse::success(status).into_response_with_status(StatusCode::OK)
}
