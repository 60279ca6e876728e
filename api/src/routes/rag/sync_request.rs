use component_index::SyncRequest;
use serde::Deserialize;

use crate::error_handler::AppError;

/// Request payload for POST /rag/sync.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagSyncRequest {
    /// Root of the component source tree to scan.
    pub source_path: String,
    #[serde(default)]
    pub force_reindex: bool,
    /// When non-empty, only these packages are indexed.
    #[serde(default)]
    pub packages: Vec<String>,
}

impl RagSyncRequest {
    pub fn into_core(self) -> Result<SyncRequest, AppError> {
        if self.source_path.trim().is_empty() {
            return Err(AppError::BadRequest("sourcePath missing".into()));
        }
        Ok(SyncRequest {
            source_path: Some(self.source_path),
            packages: self.packages,
            force_reindex: self.force_reindex,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_path_is_required() {
        let req: RagSyncRequest = serde_json::from_str(r#"{"sourcePath":" "}"#).unwrap();
        assert!(req.into_core().is_err());
    }

    #[test]
    fn optional_fields_default() {
        let req: RagSyncRequest = serde_json::from_str(r#"{"sourcePath":"./root"}"#).unwrap();
        let core = req.into_core().unwrap();
        assert!(!core.force_reindex);
        assert!(core.packages.is_empty());
        assert_eq!(core.source_path.as_deref(), Some("./root"));
    }
}
