//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for component-index operations.
///
/// Every variant maps onto a stable machine-readable code via
/// [`RciError::code`]; the HTTP layer relies on those codes for its status
/// mapping.
#[derive(Debug, Error)]
pub enum RciError {
    /// Store bootstrap failure; fatal to the service.
    #[error("initialization failed: {0}")]
    Init(String),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The components directory could not be listed; fatal to the sync.
    #[error("component source tree unreadable: {0}")]
    SourceTree(String),

    /// A single component failed to parse; the walk continues.
    #[error("failed to parse component {component}: {message}")]
    ComponentParse { component: String, message: String },

    /// Embedding provider failure other than auth/quota.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Provider signalled quota exhaustion; not retryable.
    #[error("embedding provider quota exceeded")]
    QuotaExceeded,

    /// Provider rejected the credentials; not retryable.
    #[error("embedding provider rejected credentials")]
    AuthFailed,

    /// I/O failure on the backing store or source tree.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization failure.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Mismatch in vector dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Backing store failure.
    #[error("vector store error: {0}")]
    Store(String),

    /// Composite failure in a search request.
    #[error("search failed: {0}")]
    Search(String),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
}

impl RciError {
    /// Stable error code surfaced through the HTTP contract.
    pub fn code(&self) -> &'static str {
        match self {
            RciError::Init(_) | RciError::Config(_) => "INIT_ERROR",
            RciError::SourceTree(_) | RciError::ComponentParse { .. } => "COMPONENT_PARSE_ERROR",
            RciError::Embedding(_) => "EMBEDDING_ERROR",
            RciError::QuotaExceeded => "QUOTA_EXCEEDED",
            RciError::AuthFailed => "AUTH_FAILED",
            RciError::Io(_)
            | RciError::Parse(_)
            | RciError::VectorSizeMismatch { .. }
            | RciError::Store(_) => "VECTOR_STORE_ERROR",
            RciError::Search(_) => "SEARCH_ERROR",
            RciError::Cancelled => "CANCELLED",
        }
    }
}

/// Result alias used across the crate.
pub type RciResult<T> = Result<T, RciError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(RciError::Init("x".into()).code(), "INIT_ERROR");
        assert_eq!(
            RciError::ComponentParse {
                component: "Button".into(),
                message: "bad".into()
            }
            .code(),
            "COMPONENT_PARSE_ERROR"
        );
        assert_eq!(RciError::QuotaExceeded.code(), "QUOTA_EXCEEDED");
        assert_eq!(RciError::AuthFailed.code(), "AUTH_FAILED");
        assert_eq!(
            RciError::VectorSizeMismatch { got: 3, want: 1536 }.code(),
            "VECTOR_STORE_ERROR"
        );
        assert_eq!(RciError::Cancelled.code(), "CANCELLED");
    }
}
