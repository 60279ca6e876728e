//! Search pipeline: cache lookup → query embedding → filtered top-k →
//! per-component aggregation → ranked response.

use std::collections::BTreeMap;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::cache::SmartCache;
use crate::embed::Embedder;
use crate::errors::{RciError, RciResult};
use crate::file_store::FileVectorStore;
use crate::record::{
    ComponentDoc, FacetKind, SearchRequest, SearchResponse, VectorDocument,
};

/// Facet weight applied on top of the raw similarity.
fn facet_weight(facet: FacetKind) -> f32 {
    match facet {
        FacetKind::Description => 1.2,
        FacetKind::Api => 1.0,
        FacetKind::Example => 0.8,
        FacetKind::Usage => 1.0,
    }
}

/// Per-hit relevance: similarity × facet weight × keyword boost, clamped
/// to 1.0. The boost fires when the hit content contains the query as a
/// case-insensitive substring.
fn relevance(similarity: f32, facet: FacetKind, content: &str, query_lower: &str) -> f32 {
    let mut score = similarity * facet_weight(facet);
    if content.to_lowercase().contains(query_lower) {
        score *= 1.3;
    }
    score.min(1.0)
}

/// Per-component total over its facet scores.
fn group_total(scores: &[f32]) -> f32 {
    if scores.is_empty() {
        return 0.0;
    }
    let max = scores.iter().cloned().fold(f32::MIN, f32::max);
    let mean = scores.iter().sum::<f32>() / scores.len() as f32;
    max * 0.7 + mean * 0.3
}

fn suggestions(names: &[String]) -> Vec<String> {
    match names.len() {
        0 => vec![
            "Try using more general terms in your search".to_string(),
            "Check if the component name is correct".to_string(),
        ],
        1 => vec![format!("Found perfect match: {}", names[0])],
        n => vec![
            format!("Found {n} relevant components"),
            format!("Top match: {}", names[0]),
        ],
    }
}

struct Group {
    scores: Vec<f32>,
    description: Option<String>,
    tags: Vec<String>,
    version: String,
}

/// Runs one search request end to end.
pub async fn run_search(
    store: &FileVectorStore,
    embedder: &dyn Embedder,
    cache: &SmartCache,
    req: &SearchRequest,
    cancel: &CancellationToken,
) -> RciResult<SearchResponse> {
    let started = Instant::now();
    let query = req.query.trim();
    if query.is_empty() {
        return Err(RciError::Search("query must not be empty".into()));
    }
    if cancel.is_cancelled() {
        return Err(RciError::Cancelled);
    }

    let vectors = embedder.embed(&[req.query.clone()]).await?;
    let query_vector = vectors
        .into_iter()
        .next()
        .ok_or_else(|| RciError::Embedding("provider returned no vector for query".into()))?;
    if cancel.is_cancelled() {
        return Err(RciError::Cancelled);
    }

    if let Some(mut hit) = cache.get(query, Some(&query_vector), req.filters.as_ref()) {
        hit.duration = started.elapsed().as_millis() as u64;
        debug!(query = %query, "search served from cache");
        return Ok(hit);
    }

    // Over-fetch so per-component grouping has enough facets to aggregate.
    let fetch_k = (req.top_k * 20).min(1000).max(req.top_k);
    let hits = match req.filters.as_ref().filter(|f| !f.is_empty()) {
        Some(filters) => {
            store
                .top_k_filtered(&query_vector, filters, fetch_k, req.threshold)
                .await?
        }
        None => store.top_k(&query_vector, fetch_k, req.threshold).await?,
    };
    if cancel.is_cancelled() {
        return Err(RciError::Cancelled);
    }
    trace!(hits = hits.len(), "raw store hits");

    let query_lower = query.to_lowercase();
    let mut groups: BTreeMap<(String, String), Group> = BTreeMap::new();
    for (similarity, doc) in &hits {
        let VectorDocument {
            content, metadata, ..
        } = doc;
        let key = (metadata.package_name.clone(), metadata.component_name.clone());
        let group = groups.entry(key).or_insert_with(|| Group {
            scores: Vec::new(),
            description: None,
            tags: metadata.tags.clone(),
            version: metadata.version.clone(),
        });
        group
            .scores
            .push(relevance(*similarity, metadata.facet, content, &query_lower));
        if metadata.facet == FacetKind::Description && group.description.is_none() {
            group.description = Some(content.clone());
        }
    }

    // BTreeMap iteration gives the stable (packageName, componentName)
    // tiebreak for equal totals; the sort is stable.
    let mut ranked: Vec<((String, String), Group, f32)> = groups
        .into_iter()
        .map(|(key, group)| {
            let total = group_total(&group.scores);
            (key, group, total)
        })
        .collect();
    ranked.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(req.top_k);

    let now = chrono::Utc::now().to_rfc3339();
    let mut components = Vec::with_capacity(ranked.len());
    let mut scores = Vec::with_capacity(ranked.len());
    for ((package_name, component_name), group, total) in ranked {
        components.push(ComponentDoc {
            package_name,
            component_name,
            description: group.description.unwrap_or_default(),
            api: String::new(),
            examples: Vec::new(),
            tags: group.tags,
            version: group.version,
            dependencies: Vec::new(),
            updated_at: now.clone(),
        });
        scores.push(total);
    }

    let confidence = if scores.is_empty() {
        0.0
    } else {
        let mean = scores.iter().sum::<f32>() / scores.len() as f32;
        let max = scores.iter().cloned().fold(f32::MIN, f32::max);
        mean * 0.6 + max * 0.4
    };

    let names: Vec<String> = components.iter().map(|c| c.component_name.clone()).collect();
    let response = SearchResponse {
        suggestions: suggestions(&names),
        components,
        scores,
        confidence,
        duration: started.elapsed().as_millis() as u64,
    };

    cache.set(
        query,
        response.clone(),
        Some(query_vector),
        req.filters.as_ref(),
    );
    info!(
        query = %query,
        results = response.components.len(),
        confidence = response.confidence,
        duration_ms = response.duration,
        "search finished"
    );
    Ok(response)
}
