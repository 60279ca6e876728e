//! File-backed dense vector store.
//!
//! Three JSON files under `base_path`:
//! - `documents.json` — full [`VectorDocument`]s including content
//! - `vectors.json`   — `{id, embedding, metadata}` rows, redundant with
//!   `documents.json` for read-efficiency; readers tolerate either file
//! - `metadata.json`  — document count, byte size, last update, version
//!
//! The store keeps its state in memory behind an async `RwLock` and
//! persists every mutation through a temp-file + rename, so a torn write
//! leaves either the pre- or the post-state on disk. Concurrent reads and
//! writes are serialisable: searches never observe a partial batch.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, trace};

use crate::errors::{RciError, RciResult};
use crate::filters;
use crate::record::{IndexEntry, SearchFilters, StoreMeta, StoreStats, VectorDocument};
use crate::similarity::cosine;

const DOCUMENTS_FILE: &str = "documents.json";
const VECTORS_FILE: &str = "vectors.json";
const METADATA_FILE: &str = "metadata.json";
const STORE_VERSION: &str = "1.0.0";

/// Append-dominant vector index persisted as JSON files.
pub struct FileVectorStore {
    base_path: PathBuf,
    dimension: usize,
    state: RwLock<StoreState>,
}

struct StoreState {
    documents: Vec<VectorDocument>,
    meta: StoreMeta,
}

impl FileVectorStore {
    /// Opens (and initializes if absent) the store under `base_path`.
    ///
    /// # Errors
    /// Returns [`RciError::Init`] when the backing cannot be created or an
    /// existing backing cannot be read.
    pub async fn open(base_path: impl Into<PathBuf>, dimension: usize) -> RciResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| RciError::Init(format!("{}: {e}", base_path.display())))?;

        let documents = load_documents(&base_path)
            .await
            .map_err(|e| RciError::Init(e.to_string()))?;
        let meta = load_meta(&base_path).await.unwrap_or_else(|| StoreMeta {
            total_documents: documents.len(),
            index_size: 0,
            last_updated: chrono::Utc::now().to_rfc3339(),
            version: STORE_VERSION.to_string(),
        });

        let store = Self {
            base_path,
            dimension,
            state: RwLock::new(StoreState { documents, meta }),
        };

        let documents = {
            let mut state = store.state.write().await;
            store
                .persist(&mut state)
                .await
                .map_err(|e| RciError::Init(e.to_string()))?;
            state.documents.len()
        };

        info!(
            path = %store.base_path.display(),
            documents,
            "vector store opened"
        );
        Ok(store)
    }

    /// Appends documents, skipping any whose id already exists.
    ///
    /// Returns the number of documents actually added. Repeated calls with
    /// the same batch leave the store unchanged.
    ///
    /// # Errors
    /// [`RciError::VectorSizeMismatch`] when an embedding does not match
    /// the index dimension; I/O errors from persisting.
    pub async fn add_batch(&self, docs: Vec<VectorDocument>) -> RciResult<usize> {
        for doc in &docs {
            if doc.embedding.len() != self.dimension {
                return Err(RciError::VectorSizeMismatch {
                    got: doc.embedding.len(),
                    want: self.dimension,
                });
            }
        }

        let mut state = self.state.write().await;
        let existing: HashSet<String> =
            state.documents.iter().map(|d| d.id.clone()).collect();

        let mut added = 0usize;
        let mut seen = existing;
        for doc in docs {
            if seen.insert(doc.id.clone()) {
                state.documents.push(doc);
                added += 1;
            }
        }

        if added > 0 {
            self.persist(&mut state).await?;
        }
        debug!(added, total = state.documents.len(), "add_batch");
        Ok(added)
    }

    /// Removes documents by id; a full rewrite of the backing.
    pub async fn delete(&self, ids: &[String]) -> RciResult<usize> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut state = self.state.write().await;
        let before = state.documents.len();
        state.documents.retain(|d| !wanted.contains(d.id.as_str()));
        let removed = before - state.documents.len();
        if removed > 0 {
            self.persist(&mut state).await?;
        }
        debug!(removed, "delete");
        Ok(removed)
    }

    /// Replaces all tables with empty ones.
    pub async fn clear(&self) -> RciResult<()> {
        let mut state = self.state.write().await;
        state.documents.clear();
        self.persist(&mut state).await?;
        info!("vector store cleared");
        Ok(())
    }

    /// Cosine top-k over the whole index.
    ///
    /// Returns at most `k` `(score, document)` pairs with score ≥
    /// `threshold`, sorted non-ascending.
    pub async fn top_k(
        &self,
        query: &[f32],
        k: usize,
        threshold: f32,
    ) -> RciResult<Vec<(f32, VectorDocument)>> {
        self.top_k_where(query, k, threshold, None).await
    }

    /// Cosine top-k with metadata filters applied before taking `k`.
    pub async fn top_k_filtered(
        &self,
        query: &[f32],
        filters: &SearchFilters,
        k: usize,
        threshold: f32,
    ) -> RciResult<Vec<(f32, VectorDocument)>> {
        self.top_k_where(query, k, threshold, Some(filters)).await
    }

    async fn top_k_where(
        &self,
        query: &[f32],
        k: usize,
        threshold: f32,
        filters: Option<&SearchFilters>,
    ) -> RciResult<Vec<(f32, VectorDocument)>> {
        if query.len() != self.dimension {
            return Err(RciError::VectorSizeMismatch {
                got: query.len(),
                want: self.dimension,
            });
        }

        let state = self.state.read().await;
        let mut scored: Vec<(f32, &VectorDocument)> = Vec::new();
        for doc in &state.documents {
            if let Some(f) = filters {
                if !filters::matches(f, &doc.metadata) {
                    continue;
                }
            }
            let score = cosine(query, &doc.embedding)?;
            if score >= threshold {
                scored.push((score, doc));
            }
        }

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        trace!(hits = scored.len(), k, threshold, "top_k");
        Ok(scored
            .into_iter()
            .map(|(score, doc)| (score, doc.clone()))
            .collect())
    }

    /// Aggregate statistics over the index and its backing files.
    pub async fn stats(&self) -> RciResult<StoreStats> {
        let state = self.state.read().await;

        let mut components: BTreeSet<(String, String)> = BTreeSet::new();
        let mut package_stats: BTreeMap<String, usize> = BTreeMap::new();
        for doc in &state.documents {
            components.insert((
                doc.metadata.package_name.clone(),
                doc.metadata.component_name.clone(),
            ));
            *package_stats
                .entry(doc.metadata.package_name.clone())
                .or_insert(0) += 1;
        }

        Ok(StoreStats {
            total_components: components.len(),
            total_documents: state.documents.len(),
            index_size: self.backing_size().await,
            last_updated: state.meta.last_updated.clone(),
            package_stats,
        })
    }

    async fn backing_size(&self) -> u64 {
        let mut total = 0u64;
        for file in [DOCUMENTS_FILE, VECTORS_FILE, METADATA_FILE] {
            if let Ok(meta) = fs::metadata(self.base_path.join(file)).await {
                total += meta.len();
            }
        }
        total
    }

    /// Writes all three tables; must be called with the write lock held.
    async fn persist(&self, state: &mut StoreState) -> RciResult<()> {
        let documents = serde_json::to_vec(&state.documents)?;
        write_atomic(&self.base_path.join(DOCUMENTS_FILE), &documents).await?;

        let entries: Vec<IndexEntry> = state.documents.iter().map(IndexEntry::from).collect();
        let vectors = serde_json::to_vec(&entries)?;
        write_atomic(&self.base_path.join(VECTORS_FILE), &vectors).await?;

        state.meta = StoreMeta {
            total_documents: state.documents.len(),
            index_size: (documents.len() + vectors.len()) as u64,
            last_updated: chrono::Utc::now().to_rfc3339(),
            version: STORE_VERSION.to_string(),
        };
        let meta = serde_json::to_vec(&state.meta)?;
        write_atomic(&self.base_path.join(METADATA_FILE), &meta).await?;
        Ok(())
    }
}

/// Temp-file + rename write; a crash leaves either the old or new content.
async fn write_atomic(path: &Path, bytes: &[u8]) -> RciResult<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

/// Loads documents, preferring `documents.json` and falling back to the
/// redundant `vectors.json` layout (content is then empty).
async fn load_documents(base_path: &Path) -> RciResult<Vec<VectorDocument>> {
    let documents_path = base_path.join(DOCUMENTS_FILE);
    if let Ok(raw) = fs::read(&documents_path).await {
        return Ok(serde_json::from_slice(&raw)?);
    }

    let vectors_path = base_path.join(VECTORS_FILE);
    if let Ok(raw) = fs::read(&vectors_path).await {
        let entries: Vec<IndexEntry> = serde_json::from_slice(&raw)?;
        return Ok(entries
            .into_iter()
            .map(|e| VectorDocument {
                id: e.id,
                content: String::new(),
                embedding: e.embedding,
                metadata: e.metadata,
            })
            .collect());
    }

    Ok(Vec::new())
}

async fn load_meta(base_path: &Path) -> Option<StoreMeta> {
    let raw = fs::read(base_path.join(METADATA_FILE)).await.ok()?;
    serde_json::from_slice(&raw).ok()
}
