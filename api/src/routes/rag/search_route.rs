use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::rci_error_response,
    routes::rag::search_request::RagSearchRequest,
};

/// Handler: POST /rag/search
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/rag/search \
///   -H 'content-type: application/json' \
///   -d '{"query":"a clickable button","topK":5,"threshold":0.3}'
/// ```
pub async fn rag_search_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(p): Json<RagSearchRequest>,
) -> Response {
    let request_id = headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-");

    debug!(
        request_id = %request_id,
        query = %p.query,
        "rag_search_route: start"
    );

    let req = match p.into_core() {
        Ok(req) => req,
        Err(err) => return err.into_response(),
    };

    match state.service.search(&req).await {
        Ok(data) => {
            debug!(
                request_id = %request_id,
                hits = data.components.len(),
                duration_ms = data.duration,
                "rag_search_route: success"
            );
            ApiResponse::success(data).into_response_with_status(StatusCode::OK)
        }
        Err(err) => {
            error!(
                request_id = %request_id,
                code = err.code(),
                error = %err,
                "rag_search_route: search failed"
            );
            rci_error_response(&err)
        }
    }
}
