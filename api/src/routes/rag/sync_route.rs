use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, info};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::rci_error_response,
    routes::rag::sync_request::RagSyncRequest,
};

/// Handler: POST /rag/sync
///
/// Re-scans a component source tree and refreshes the index. Per-component
/// failures are reported inside the payload; only fatal errors (missing
/// tree, store failures, provider auth/quota) map to error statuses.
pub async fn rag_sync_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(p): Json<RagSyncRequest>,
) -> Response {
    if let Some(id) = headers.get("X-Request-Id").and_then(|h| h.to_str().ok()) {
        debug!(%id, "request id attached");
    }

    let req = match p.into_core() {
        Ok(req) => req,
        Err(err) => return err.into_response(),
    };

    match state.service.sync(&req).await {
        Ok(data) => {
            info!(
                processed = data.processed_count,
                failed = data.failed_count,
                duration_ms = data.duration,
                "rag_sync_route: finished"
            );
            ApiResponse::success(data).into_response_with_status(StatusCode::OK)
        }
        Err(err) => {
            error!(code = err.code(), error = %err, "rag_sync_route: sync failed");
            rci_error_response(&err)
        }
    }
}
