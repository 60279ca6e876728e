use std::{env, sync::Arc};

mod core;
mod error_handler;
mod routes;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use component_index::RciService;
use tokio::signal;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::rag::{
        clear_cache_route::rag_clear_cache_route, search_route::rag_search_route,
        status_route::rag_status_route, sync_route::rag_sync_route,
    },
};

pub async fn start(service: Arc<RciService>) -> AppResult<()> {
    // Strict env read with explicit error
    let host_url = env::var("API_ADDRESS").map_err(|_| AppError::MissingEnv("API_ADDRESS"))?;

    // Build shared state
    let shared_state = Arc::new(AppState::new(service));

    // Routes
    let app = Router::new()
        .route("/rag/search", post(rag_search_route))
        .route("/rag/sync", post(rag_sync_route))
        .route("/rag/status", get(rag_status_route))
        .route("/rag/cache/clear", post(rag_clear_cache_route))
        .fallback(handler_404) // unified 404
        .with_state(shared_state);

    // Bind & serve with graceful shutdown
    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Graceful shutdown on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

/// Fallback handler for unmatched routes.
async fn handler_404() -> impl IntoResponse {
    AppError::NotFound
}
