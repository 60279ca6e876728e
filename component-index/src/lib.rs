//! Retrieval-augmented component index core.
//!
//! This crate provides a clean API to:
//! - Parse a tree of UI-component documentation into canonical records
//! - Embed text facets through a remote provider (batched, with retries)
//! - Persist and search a file-backed dense vector index
//! - Short-circuit repeated or near-duplicate queries via a smart cache
//!
//! The design is flat (no deep nesting) and splits responsibilities into
//! focused modules; [`RciService`] is the single entry point recommended
//! for application code.

mod cache;
mod config;
mod embed;
mod errors;
mod file_store;
mod filters;
mod ingest;
mod parser;
mod record;
mod retrieve;
mod similarity;

pub use cache::SmartCache;
pub use config::{CacheConfig, EmbeddingsConfig, RciConfig, StoreConfig};
pub use embed::{openai::OpenAiEmbedder, Embedder, ModelDescriptor};
pub use errors::{RciError, RciResult};
pub use file_store::FileVectorStore;
pub use parser::ComponentParser;
pub use record::{
    CacheStats, CodegenRule, ComponentDoc, FacetKind, IndexEntry, ParseStatus, ParsedComponent,
    RuleSearchConfig, SearchFilters, SearchRequest, SearchResponse, StatusConfig, StatusReport,
    StoreMeta, StoreStats, SyncRequest, SyncResponse, SyncStatus, VectorDocument, VectorMetadata,
};
pub use similarity::cosine;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// High-level façade over parser, embedder, vector store, and cache.
///
/// Built once at startup and shared across requests; the store and cache
/// amortise their initialization cost over the process lifetime.
pub struct RciService {
    config: RciConfig,
    parser: ComponentParser,
    embedder: Arc<dyn Embedder>,
    store: FileVectorStore,
    cache: SmartCache,
}

impl RciService {
    /// Constructs a service with the OpenAI-compatible embedder from the
    /// given configuration and opens the backing store.
    ///
    /// # Errors
    /// Returns `RciError::Config` on invalid settings and `RciError::Init`
    /// when the store cannot be bootstrapped.
    pub async fn new(config: RciConfig) -> RciResult<Self> {
        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAiEmbedder::new(&config.embeddings, config.dimension)?);
        Self::with_embedder(config, embedder).await
    }

    /// Constructs a service around a caller-supplied embedding provider.
    pub async fn with_embedder(
        config: RciConfig,
        embedder: Arc<dyn Embedder>,
    ) -> RciResult<Self> {
        config.validate()?;
        trace!(path = %config.store.path, "opening vector store");
        let store = FileVectorStore::open(&config.store.path, config.dimension).await?;
        let cache = SmartCache::new(&config.cache);
        let parser = ComponentParser::new(&config.default_package);
        Ok(Self {
            config,
            parser,
            embedder,
            store,
            cache,
        })
    }

    /// Re-scans a source tree and refreshes the index.
    pub async fn sync(&self, req: &SyncRequest) -> RciResult<SyncResponse> {
        self.sync_with_cancel(req, &CancellationToken::new()).await
    }

    /// [`Self::sync`] with a caller-owned cancellation signal; on
    /// cancellation the in-flight batch completes and the response reports
    /// a partial sync.
    pub async fn sync_with_cancel(
        &self,
        req: &SyncRequest,
        cancel: &CancellationToken,
    ) -> RciResult<SyncResponse> {
        ingest::run_sync(
            &self.parser,
            self.embedder.as_ref(),
            &self.store,
            &self.cache,
            &self.config.source_root,
            req,
            cancel,
        )
        .await
    }

    /// Finds the top-k most relevant components for a query.
    pub async fn search(&self, req: &SearchRequest) -> RciResult<SearchResponse> {
        self.search_with_cancel(req, &CancellationToken::new())
            .await
    }

    /// [`Self::search`] with a caller-owned cancellation signal; a
    /// cancelled search returns `RciError::Cancelled` without partial
    /// results.
    pub async fn search_with_cancel(
        &self,
        req: &SearchRequest,
        cancel: &CancellationToken,
    ) -> RciResult<SearchResponse> {
        retrieve::run_search(&self.store, self.embedder.as_ref(), &self.cache, req, cancel).await
    }

    /// Searches under the constraints of a `ragEnhanced` codegen rule:
    /// the rule's namespace becomes a package filter and its search config
    /// overrides `topK`/`threshold`. Other rule variants leave the request
    /// untouched.
    pub async fn search_with_rule(
        &self,
        req: &SearchRequest,
        rule: &CodegenRule,
    ) -> RciResult<SearchResponse> {
        let mut req = req.clone();
        if let Some((namespace, overrides)) = rule.as_rag_enhanced() {
            let mut filters = req.filters.take().unwrap_or_default();
            filters.package_name = Some(namespace.to_string());
            req.filters = Some(filters);
            if let Some(k) = overrides.top_k {
                req.top_k = k;
            }
            if let Some(t) = overrides.threshold {
                req.threshold = t;
            }
            debug!(namespace, "applied ragEnhanced rule to search");
        }
        self.search(&req).await
    }

    /// Health report: store stats, effective config, and a timestamp.
    /// `available` is true iff the store answered the stats query.
    pub async fn status(&self) -> StatusReport {
        let stats = self.store.stats().await;
        StatusReport {
            available: stats.is_ok(),
            stats: stats.ok(),
            config: StatusConfig {
                vector_store: self.config.store.kind.clone(),
                embedding_model: self.config.embeddings.model.clone(),
                dimension: self.config.dimension,
                cache: self.config.cache.enabled,
            },
            checked_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Drops all cached search responses.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Smart-cache telemetry snapshot.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Effective configuration.
    pub fn config(&self) -> &RciConfig {
        &self.config
    }
}
