//! Sync pipeline: source tree → facet expansion → embeddings → store.
//!
//! Components are processed in batches of ten; within a batch the
//! component-to-vectors work runs concurrently and the whole batch lands
//! in a single store append. Per-component failures are collected and
//! never abort the sync; store failures do.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Instant;

use md5::{Digest, Md5};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::SmartCache;
use crate::embed::Embedder;
use crate::errors::{RciError, RciResult};
use crate::file_store::FileVectorStore;
use crate::parser::{ComponentParser, API_FALLBACK};
use crate::record::{
    ComponentDoc, FacetKind, ParseStatus, SyncRequest, SyncResponse, SyncStatus, VectorDocument,
    VectorMetadata,
};

/// Components per concurrent batch.
const SYNC_BATCH: usize = 10;

/// Runs one index refresh.
pub async fn run_sync(
    parser: &ComponentParser,
    embedder: &dyn Embedder,
    store: &FileVectorStore,
    cache: &SmartCache,
    default_source_root: &str,
    req: &SyncRequest,
    cancel: &CancellationToken,
) -> RciResult<SyncResponse> {
    let started = Instant::now();
    let source = req
        .source_path
        .as_deref()
        .unwrap_or(default_source_root)
        .to_string();
    info!(source = %source, force = req.force_reindex, "sync started");

    let parsed = parser.parse_all(Path::new(&source)).await?;

    let selected: Vec<_> = if req.packages.is_empty() {
        parsed
    } else {
        parsed
            .into_iter()
            .filter(|p| req.packages.contains(&p.info.package_name))
            .collect()
    };
    let processed_count = selected.len();

    if req.force_reindex {
        store.clear().await?;
    }

    let mut errors: Vec<String> = Vec::new();
    let mut ok: Vec<ComponentDoc> = Vec::new();
    for comp in selected {
        match comp.status {
            ParseStatus::Success => ok.push(comp.info),
            ParseStatus::Error => {
                let message = comp.error.unwrap_or_else(|| "unknown parse error".into());
                errors.push(format!("{}: {message}", comp.info.component_name));
            }
        }
    }

    let mut success_count = 0usize;
    let mut attempted = 0usize;
    let mut cancelled = false;

    for batch in ok.chunks(SYNC_BATCH) {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let futures: Vec<_> = batch.iter().map(|doc| embed_one(embedder, doc)).collect();
        let results: Vec<(String, RciResult<Vec<VectorDocument>>)> =
            futures::future::join_all(futures).await;

        let mut vectors: Vec<VectorDocument> = Vec::new();
        for (name, result) in results {
            match result {
                Ok(v) => {
                    success_count += 1;
                    vectors.extend(v);
                }
                Err(e) => {
                    warn!(component = %name, error = %e, "component embedding failed");
                    errors.push(format!("{name}: {e}"));
                }
            }
        }

        if !vectors.is_empty() {
            store.add_batch(vectors).await?;
        }
        attempted += batch.len();
    }

    let failed_count = errors.len();
    if cancelled {
        errors.push(format!("cancelled after {attempted} components"));
    }

    cache.clear();

    let status = if cancelled {
        SyncStatus::Partial
    } else if errors.is_empty() {
        SyncStatus::Success
    } else if success_count > 0 {
        SyncStatus::Partial
    } else {
        SyncStatus::Failed
    };

    let response = SyncResponse {
        status,
        processed_count,
        success_count,
        failed_count,
        errors,
        duration: started.elapsed().as_millis() as u64,
    };
    info!(
        processed = response.processed_count,
        succeeded = response.success_count,
        failed = response.failed_count,
        duration_ms = response.duration,
        "sync finished"
    );
    Ok(response)
}

/// Embeds a single component for use inside a concurrent batch; pairs the
/// result with the component name for error reporting.
fn embed_one<'a>(
    embedder: &'a dyn Embedder,
    doc: &'a ComponentDoc,
) -> Pin<Box<dyn Future<Output = (String, RciResult<Vec<VectorDocument>>)> + Send + 'a>> {
    Box::pin(async move {
        let name = doc.component_name.clone();
        (name, create_component_vectors(embedder, doc).await)
    })
}

/// Expands one component into vector documents: description, API (when not
/// the placeholder), and each non-empty example, embedded in one batched
/// call. Returns an empty list when the component has no indexable text.
pub async fn create_component_vectors(
    embedder: &dyn Embedder,
    doc: &ComponentDoc,
) -> RciResult<Vec<VectorDocument>> {
    let mut facets: Vec<(FacetKind, String)> = Vec::new();
    if !doc.description.trim().is_empty() {
        facets.push((FacetKind::Description, doc.description.clone()));
    }
    if !doc.api.trim().is_empty() && doc.api != API_FALLBACK {
        facets.push((FacetKind::Api, doc.api.clone()));
    }
    for example in doc.examples.iter().take(3) {
        if !example.trim().is_empty() {
            facets.push((FacetKind::Example, example.clone()));
        }
    }

    if facets.is_empty() {
        debug!(component = %doc.component_name, "no indexable text");
        return Ok(Vec::new());
    }

    let texts: Vec<String> = facets.iter().map(|(_, t)| t.clone()).collect();
    let vectors = embedder.embed(&texts).await?;
    if vectors.len() != texts.len() {
        return Err(RciError::Embedding(format!(
            "expected {} vectors, got {}",
            texts.len(),
            vectors.len()
        )));
    }

    Ok(facets
        .into_iter()
        .zip(vectors)
        .map(|((facet, content), embedding)| VectorDocument {
            id: vector_id(&doc.component_name, facet, &content),
            content,
            embedding,
            metadata: VectorMetadata {
                component_name: doc.component_name.clone(),
                package_name: doc.package_name.clone(),
                facet,
                tags: doc.tags.clone(),
                version: doc.version.clone(),
            },
        })
        .collect())
}

/// Content-addressed document id, stable under unchanged input:
/// `<componentName>-<facet>-<md5(componentName+facet+content)[:8]>`.
fn vector_id(component_name: &str, facet: FacetKind, content: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(component_name.as_bytes());
    hasher.update(facet.as_str().as_bytes());
    hasher.update(content.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{component_name}-{}-{}", facet.as_str(), &digest[..8])
}
