use component_index::{SearchFilters, SearchRequest};
use serde::Deserialize;

use crate::error_handler::AppError;

/// Request payload for POST /rag/search.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagSearchRequest {
    /// Natural language query.
    pub query: String,
    /// Number of components to return (1..=50).
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Minimum similarity for a facet to count (0..=1).
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default)]
    pub filters: Option<SearchFilters>,
}

impl RagSearchRequest {
    /// Validates bounds and converts into the core request.
    pub fn into_core(self) -> Result<SearchRequest, AppError> {
        if self.query.trim().is_empty() {
            return Err(AppError::BadRequest("query missing".into()));
        }
        let top_k = self.top_k.unwrap_or(5);
        if !(1..=50).contains(&top_k) {
            return Err(AppError::BadRequest("topK out of range".into()));
        }
        let threshold = self.threshold.unwrap_or(0.5);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AppError::BadRequest("threshold out of range".into()));
        }
        Ok(SearchRequest {
            query: self.query,
            top_k,
            threshold,
            filters: self.filters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(raw: &str) -> RagSearchRequest {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn defaults_are_applied() {
        let core = request(r#"{"query":"button"}"#).into_core().unwrap();
        assert_eq!(core.top_k, 5);
        assert_eq!(core.threshold, 0.5);
    }

    #[test]
    fn empty_query_is_rejected() {
        let err = request(r#"{"query":"  "}"#).into_core().unwrap_err();
        assert!(err.to_string().contains("query missing"));
    }

    #[test]
    fn top_k_bounds_are_enforced() {
        assert!(request(r#"{"query":"x","topK":0}"#).into_core().is_err());
        assert!(request(r#"{"query":"x","topK":51}"#).into_core().is_err());
        assert!(request(r#"{"query":"x","topK":50}"#).into_core().is_ok());
    }

    #[test]
    fn threshold_bounds_are_enforced() {
        assert!(request(r#"{"query":"x","threshold":-0.1}"#).into_core().is_err());
        assert!(request(r#"{"query":"x","threshold":1.1}"#).into_core().is_err());
        assert!(request(r#"{"query":"x","threshold":1.0}"#).into_core().is_ok());
    }

    #[test]
    fn filters_pass_through() {
        let core = request(
            r#"{"query":"x","filters":{"packageName":"@p/base","tags":["form"]}}"#,
        )
        .into_core()
        .unwrap();
        let filters = core.filters.unwrap();
        assert_eq!(filters.package_name.as_deref(), Some("@p/base"));
        assert_eq!(filters.tags.unwrap(), vec!["form"]);
    }
}
