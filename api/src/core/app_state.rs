use std::sync::Arc;

use component_index::RciService;

/// Shared application state for all HTTP handlers.
///
/// The index service is built once at startup and lives for the whole
/// process, so the vector store and cache amortise their init cost across
/// requests.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RciService>,
}

impl AppState {
    pub fn new(service: Arc<RciService>) -> Self {
        Self { service }
    }
}
