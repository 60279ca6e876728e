use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use serde::Serialize;
use tracing::debug;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

/// Response payload for POST /rag/cache/clear.
#[derive(Serialize)]
pub struct ClearCacheResponse {
    pub message: String,
}

/// Handler: POST /rag/cache/clear
pub async fn rag_clear_cache_route(State(state): State<Arc<AppState>>) -> Response {
    state.service.clear_cache();
    debug!("rag_clear_cache_route: cache cleared");
    ApiResponse::success(ClearCacheResponse {
        message: "Search cache cleared".to_string(),
    })
    .into_response_with_status(StatusCode::OK)
}
