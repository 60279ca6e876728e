use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use component_index::RciError;
use thiserror::Error;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    /// Error surfaced from the index core, carrying its stable code.
    #[error(transparent)]
    Index(#[from] RciError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingEnv(_) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Index(e) => rci_status(e),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingEnv(_) => "MISSING_ENV",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound => "NOT_FOUND",
            AppError::Index(e) => e.code(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let resp: ApiResponse<()> = ApiResponse::error(self.error_code(), self.to_string(), None);
        resp.into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// HTTP status for a core error.
///
/// The mapping follows the external contract: 401 for rejected
/// credentials, 429 for quota, 503 when the embedding provider is
/// unreachable, 404/403 for a missing or unreadable source tree, and 500
/// for everything else.
pub fn rci_status(err: &RciError) -> StatusCode {
    match err {
        RciError::AuthFailed => StatusCode::UNAUTHORIZED,
        RciError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
        RciError::Embedding(_) => StatusCode::SERVICE_UNAVAILABLE,
        RciError::SourceTree(_) => StatusCode::NOT_FOUND,
        RciError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            StatusCode::FORBIDDEN
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error envelope for a core error, with its stable code attached.
pub fn rci_error_response(err: &RciError) -> Response {
    let resp: ApiResponse<()> = ApiResponse::error(err.code(), err.to_string(), None);
    resp.into_response_with_status(rci_status(err))
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
