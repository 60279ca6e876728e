//! Canonical data models and public API types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Canonical per-component record produced by the parser.
///
/// `(package_name, component_name)` is globally unique within the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDoc {
    /// Opaque namespace tag, e.g. `"@private/basic-components"`.
    /// Preserved bit-identically through the whole pipeline.
    pub package_name: String,
    /// PascalCase name derived from the component directory.
    pub component_name: String,
    /// Free text extracted from the doc page (clamped to ~1k chars).
    pub description: String,
    /// API section text, or `"API documentation not available"`.
    pub api: String,
    /// Up to three demo snippets with import lines stripped.
    pub examples: Vec<String>,
    /// Lowercase tags; always contains `react` and `component`.
    pub tags: Vec<String>,
    /// Version from the package manifest, `"1.0.0"` when absent.
    pub version: String,
    /// PascalCase names of sibling components imported by `index.ts`.
    pub dependencies: Vec<String>,
    /// RFC3339 timestamp of the last parse.
    pub updated_at: String,
}

impl ComponentDoc {
    /// Empty placeholder used when a component fails to parse.
    pub fn empty(component_name: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            component_name: component_name.into(),
            description: String::new(),
            api: String::new(),
            examples: Vec::new(),
            tags: Vec::new(),
            version: String::new(),
            dependencies: Vec::new(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Outcome of parsing a single component directory.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedComponent {
    pub info: ComponentDoc,
    /// Path of the component directory that was parsed.
    pub file_path: String,
    pub status: ParseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseStatus {
    Success,
    Error,
}

/// One text facet of a component that becomes a vector document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetKind {
    Description,
    Api,
    Example,
    Usage,
}

impl FacetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacetKind::Description => "description",
            FacetKind::Api => "api",
            FacetKind::Example => "example",
            FacetKind::Usage => "usage",
        }
    }
}

/// Metadata carried by every stored vector document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorMetadata {
    pub component_name: String,
    pub package_name: String,
    #[serde(rename = "type")]
    pub facet: FacetKind,
    pub tags: Vec<String>,
    pub version: String,
}

/// Storage record: one embedded text facet.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorDocument {
    /// Deterministic, content-addressed id:
    /// `<componentName>-<facet>-<md5(componentName+facet+content)[:8]>`.
    pub id: String,
    /// The literal text that was embedded.
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: VectorMetadata,
}

/// Row of `vectors.json`, redundant with `documents.json` for read-efficiency.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: VectorMetadata,
}

impl From<&VectorDocument> for IndexEntry {
    fn from(doc: &VectorDocument) -> Self {
        Self {
            id: doc.id.clone(),
            embedding: doc.embedding.clone(),
            metadata: doc.metadata.clone(),
        }
    }
}

/// Contents of `metadata.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMeta {
    pub total_documents: usize,
    #[serde(default)]
    pub index_size: u64,
    pub last_updated: String,
    pub version: String,
}

/// Metadata filters applied before taking top-k.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    /// Passes when ANY requested tag is present on the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub facet: Option<FacetKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.package_name.is_none()
            && self.component_name.is_none()
            && self.tags.is_none()
            && self.facet.is_none()
            && self.version.is_none()
    }
}

/// Normalized search parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default)]
    pub filters: Option<SearchFilters>,
}

fn default_top_k() -> usize {
    5
}

fn default_threshold() -> f32 {
    0.5
}

/// Ranked search result.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub components: Vec<ComponentDoc>,
    pub scores: Vec<f32>,
    pub confidence: f32,
    pub suggestions: Vec<String>,
    /// Wall-clock duration in milliseconds.
    pub duration: u64,
}

/// Parameters for one index refresh.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Tree to scan; falls back to the configured source root.
    #[serde(default)]
    pub source_path: Option<String>,
    /// When non-empty, only components of these packages are indexed.
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub force_reindex: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Partial,
    Failed,
}

/// Outcome of one index refresh.
///
/// `processed_count == success_count + failed_count` and
/// `errors.len() == failed_count` always hold.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub status: SyncStatus,
    pub processed_count: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
    /// Wall-clock duration in milliseconds.
    pub duration: u64,
}

/// Aggregate store statistics.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Distinct `(packageName, componentName)` pairs in the index.
    pub total_components: usize,
    pub total_documents: usize,
    /// Byte size of the backing files.
    pub index_size: u64,
    pub last_updated: String,
    /// Indexed document count per package.
    pub package_stats: BTreeMap<String, usize>,
}

/// Service health report.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// True iff the store answered a stats query.
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StoreStats>,
    pub config: StatusConfig,
    pub checked_at: String,
}

/// Effective configuration echoed in status responses.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusConfig {
    pub vector_store: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub cache: bool,
}

/// Smart-cache telemetry snapshot.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub avg_response_time: f64,
    /// Age of the oldest entry in milliseconds; 0 when empty.
    pub oldest_entry: u64,
    pub total_queries: u64,
}

/// Discriminated codegen rule consumed by the surrounding workflow.
///
/// The core reads only the `RagEnhanced` variant; the payloads of the other
/// variants are preserved opaquely.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CodegenRule {
    PublicComponents {
        #[serde(flatten)]
        payload: BTreeMap<String, Value>,
    },
    Styles {
        #[serde(flatten)]
        payload: BTreeMap<String, Value>,
    },
    PrivateComponents {
        #[serde(flatten)]
        payload: BTreeMap<String, Value>,
    },
    FileStructure {
        #[serde(flatten)]
        payload: BTreeMap<String, Value>,
    },
    AttentionRules {
        #[serde(flatten)]
        payload: BTreeMap<String, Value>,
    },
    #[serde(rename_all = "camelCase")]
    RagEnhanced {
        /// Package namespace the rule constrains retrieval to.
        namespace: String,
        #[serde(default)]
        search_config: RuleSearchConfig,
    },
}

/// Retrieval overrides carried by a `ragEnhanced` rule.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSearchConfig {
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub threshold: Option<f32>,
}

impl CodegenRule {
    /// Namespace and search overrides when this is a `ragEnhanced` rule.
    pub fn as_rag_enhanced(&self) -> Option<(&str, &RuleSearchConfig)> {
        match self {
            CodegenRule::RagEnhanced {
                namespace,
                search_config,
            } => Some((namespace.as_str(), search_config)),
            _ => None,
        }
    }
}
