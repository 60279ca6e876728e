//! End-to-end service tests over a temp source tree and a deterministic
//! in-process embedder.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use component_index::{
    CacheConfig, Embedder, EmbeddingsConfig, RciConfig, RciError, RciResult, RciService,
    SearchFilters, SearchRequest, StoreConfig, SyncRequest, SyncStatus,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const DIM: usize = 8;

/// Hashed bag-of-words embedder: texts sharing words get similar vectors.
struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn embed<'a, 'b>(
        &'a self,
        texts: &'b [String],
    ) -> Pin<Box<dyn Future<Output = RciResult<Vec<Vec<f32>>>> + Send + 'a>>
    where
        'b: 'a,
    {
        Box::pin(async move { Ok(texts.iter().map(|t| embed_text(t)).collect()) })
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

fn embed_text(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut h = DefaultHasher::new();
        word.hash(&mut h);
        v[(h.finish() as usize) % DIM] += 1.0;
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

fn config(index_path: &Path, source_root: &Path) -> RciConfig {
    RciConfig {
        store: StoreConfig {
            kind: "file".into(),
            path: index_path.display().to_string(),
        },
        embeddings: EmbeddingsConfig {
            provider: "openai".into(),
            model: "text-embedding-3-small".into(),
            api_key: Some("sk-test".into()),
            base_url: "https://api.openai.com".into(),
        },
        dimension: DIM,
        cache: CacheConfig {
            enabled: true,
            ttl_seconds: 300,
            max_size: 1000,
            similarity_threshold: 0.92,
        },
        source_root: source_root.display().to_string(),
        default_package: "@private/basic-components".into(),
    }
}

async fn service(index_path: &Path, source_root: &Path) -> RciService {
    RciService::with_embedder(config(index_path, source_root), Arc::new(HashEmbedder))
        .await
        .unwrap()
}

fn write_package(root: &Path, name: &str, version: &str) {
    fs::create_dir_all(root.join("components")).unwrap();
    fs::write(
        root.join("package.json"),
        format!(r#"{{"name":"{name}","version":"{version}"}}"#),
    )
    .unwrap();
}

fn write_component(root: &Path, dir: &str, description: &str, api: &str, demo: Option<&str>) {
    let base = root.join("components").join(dir);
    fs::create_dir_all(&base).unwrap();
    fs::write(
        base.join("index.en-US.md"),
        format!("---\n\n{description}\n\n## API\n\n{api}\n"),
    )
    .unwrap();
    if let Some(code) = demo {
        fs::create_dir_all(base.join("demo")).unwrap();
        fs::write(
            base.join("demo").join("basic.tsx"),
            format!("import React from 'react';\n\n{code}\n"),
        )
        .unwrap();
    }
}

fn sync_request(root: &Path) -> SyncRequest {
    SyncRequest {
        source_path: Some(root.display().to_string()),
        packages: Vec::new(),
        force_reindex: false,
    }
}

fn search_request(query: &str) -> SearchRequest {
    SearchRequest {
        query: query.into(),
        top_k: 3,
        threshold: 0.1,
        filters: None,
    }
}

#[tokio::test]
async fn empty_tree_syncs_cleanly_and_searches_empty() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("empty");
    fs::create_dir_all(root.join("components")).unwrap();

    let svc = service(&tmp.path().join("index"), &root).await;
    let sync = svc.sync(&sync_request(&root)).await.unwrap();
    assert_eq!(sync.status, SyncStatus::Success);
    assert_eq!(sync.processed_count, 0);
    assert_eq!(sync.success_count, 0);
    assert_eq!(sync.failed_count, 0);
    assert!(sync.errors.is_empty());

    let search = svc.search(&search_request("anything")).await.unwrap();
    assert!(search.components.is_empty());
    assert!(search.scores.is_empty());
    assert_eq!(search.confidence, 0.0);
    assert_eq!(
        search.suggestions,
        vec![
            "Try using more general terms in your search".to_string(),
            "Check if the component name is correct".to_string(),
        ]
    );
}

#[tokio::test]
async fn single_button_component_happy_path() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    write_package(&root, "@private/basic-components", "5.10.0");
    write_component(
        &root,
        "button",
        "A button triggers an operation when clicked.",
        "| onClick | () => void |",
        Some("export default () => <Button>Submit</Button>;"),
    );

    let svc = service(&tmp.path().join("index"), &root).await;
    let sync = svc.sync(&sync_request(&root)).await.unwrap();
    assert_eq!(sync.status, SyncStatus::Success);
    assert_eq!(sync.processed_count, 1);
    assert_eq!(sync.success_count, 1);

    // description + api + example
    let status = svc.status().await;
    assert!(status.available);
    let stats = status.stats.unwrap();
    assert_eq!(stats.total_documents, 3);
    assert_eq!(stats.total_components, 1);

    let search = svc.search(&search_request("button")).await.unwrap();
    assert_eq!(search.components.len(), 1);
    let comp = &search.components[0];
    assert_eq!(comp.component_name, "Button");
    assert_eq!(comp.package_name, "@private/basic-components");
    for tag in ["form", "action", "ui", "interactive", "react", "component"] {
        assert!(comp.tags.contains(&tag.to_string()), "missing tag {tag}");
    }
    assert!(search.confidence > 0.0);
    assert_eq!(
        search.suggestions,
        vec!["Found perfect match: Button".to_string()]
    );
}

#[tokio::test]
async fn package_filter_narrows_results() {
    let tmp = TempDir::new().unwrap();

    let root_a = tmp.path().join("a");
    write_package(&root_a, "@private/basic-components", "1.0.0");
    write_component(&root_a, "button", "A clickable button widget.", "none", None);

    let root_b = tmp.path().join("b");
    write_package(&root_b, "@private/pro-components", "1.0.0");
    write_component(&root_b, "menu", "A clickable navigation widget.", "none", None);

    let svc = service(&tmp.path().join("index"), &root_a).await;
    svc.sync(&sync_request(&root_a)).await.unwrap();
    svc.sync(&sync_request(&root_b)).await.unwrap();

    let mut req = search_request("clickable widget");
    req.filters = Some(SearchFilters {
        package_name: Some("@private/basic-components".into()),
        ..Default::default()
    });
    let search = svc.search(&req).await.unwrap();
    assert!(!search.components.is_empty());
    for comp in &search.components {
        assert_eq!(comp.package_name, "@private/basic-components");
    }
}

#[tokio::test]
async fn repeated_query_hits_the_exact_cache() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    write_package(&root, "@private/basic-components", "1.0.0");
    write_component(&root, "button", "A button triggers an operation.", "none", None);

    let svc = service(&tmp.path().join("index"), &root).await;
    svc.sync(&sync_request(&root)).await.unwrap();

    let first = svc.search(&search_request("button")).await.unwrap();
    // Same key after trim + lowercase normalization.
    let second = svc.search(&search_request("  BUTTON ")).await.unwrap();

    assert_eq!(first.components, second.components);
    assert_eq!(first.scores, second.scores);
    assert_eq!(first.confidence, second.confidence);
    assert_eq!(svc.cache_stats().hits, 1);
}

#[tokio::test]
async fn near_duplicate_query_hits_the_semantic_tier() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    write_package(&root, "@private/basic-components", "1.0.0");
    write_component(&root, "button", "A button triggers an operation.", "none", None);

    let svc = service(&tmp.path().join("index"), &root).await;
    svc.sync(&sync_request(&root)).await.unwrap();

    let first = svc.search(&search_request("button")).await.unwrap();
    // Different exact key, identical embedding under the bag-of-words stub.
    let second = svc.search(&search_request("button button")).await.unwrap();

    assert_eq!(first.components, second.components);
    assert_eq!(first.scores, second.scores);
    assert_eq!(svc.cache_stats().hits, 1);
}

#[tokio::test]
async fn sync_clears_the_cache() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    write_package(&root, "@private/basic-components", "1.0.0");
    write_component(&root, "button", "A button triggers an operation.", "none", None);

    let svc = service(&tmp.path().join("index"), &root).await;
    svc.sync(&sync_request(&root)).await.unwrap();
    svc.search(&search_request("button")).await.unwrap();
    assert_eq!(svc.cache_stats().size, 1);

    svc.sync(&sync_request(&root)).await.unwrap();
    assert_eq!(svc.cache_stats().size, 0);
}

#[tokio::test]
async fn broken_component_yields_partial_sync() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    write_package(&root, "@private/basic-components", "1.0.0");
    write_component(&root, "button", "A button triggers an operation.", "none", None);
    // Neither index.en-US.md nor demos.
    fs::create_dir_all(root.join("components/broken")).unwrap();

    let svc = service(&tmp.path().join("index"), &root).await;
    let sync = svc.sync(&sync_request(&root)).await.unwrap();

    assert_eq!(sync.status, SyncStatus::Partial);
    assert_eq!(sync.processed_count, 2);
    assert_eq!(sync.success_count, 1);
    assert_eq!(sync.failed_count, 1);
    assert_eq!(sync.errors.len(), 1);
    assert!(sync.errors[0].contains("Broken"));
}

#[tokio::test]
async fn force_reindex_replaces_previous_documents() {
    let tmp = TempDir::new().unwrap();
    let root_a = tmp.path().join("a");
    write_package(&root_a, "@private/basic-components", "1.0.0");
    write_component(&root_a, "button", "A button triggers an operation.", "none", None);

    let root_b = tmp.path().join("b");
    write_package(&root_b, "@private/pro-components", "1.0.0");
    write_component(&root_b, "menu", "A navigation menu.", "none", None);

    let svc = service(&tmp.path().join("index"), &root_a).await;
    svc.sync(&sync_request(&root_a)).await.unwrap();

    let mut req = sync_request(&root_b);
    req.force_reindex = true;
    svc.sync(&req).await.unwrap();

    let stats = svc.status().await.stats.unwrap();
    assert_eq!(stats.package_stats.len(), 1);
    assert!(stats.package_stats.contains_key("@private/pro-components"));
}

#[tokio::test]
async fn sync_idempotence_keeps_document_ids_stable() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    write_package(&root, "@private/basic-components", "1.0.0");
    write_component(&root, "button", "A button triggers an operation.", "none", None);

    let svc = service(&tmp.path().join("index"), &root).await;
    svc.sync(&sync_request(&root)).await.unwrap();
    let before = svc.status().await.stats.unwrap().total_documents;

    // Unchanged input produces identical ids; the store skips them all.
    svc.sync(&sync_request(&root)).await.unwrap();
    let after = svc.status().await.stats.unwrap().total_documents;
    assert_eq!(before, after);
}

#[tokio::test]
async fn cancelled_sync_reports_partial() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    write_package(&root, "@private/basic-components", "1.0.0");
    write_component(&root, "button", "A button triggers an operation.", "none", None);

    let svc = service(&tmp.path().join("index"), &root).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let sync = svc
        .sync_with_cancel(&sync_request(&root), &cancel)
        .await
        .unwrap();
    assert_eq!(sync.status, SyncStatus::Partial);
    assert_eq!(sync.success_count, 0);
    assert!(sync
        .errors
        .iter()
        .any(|e| e.contains("cancelled after 0 components")));
}

#[tokio::test]
async fn cancelled_search_returns_no_partial_results() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir_all(root.join("components")).unwrap();

    let svc = service(&tmp.path().join("index"), &root).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = svc
        .search_with_cancel(&search_request("button"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, RciError::Cancelled));
}

#[tokio::test]
async fn rag_enhanced_rule_constrains_the_namespace() {
    let tmp = TempDir::new().unwrap();
    let root_a = tmp.path().join("a");
    write_package(&root_a, "@private/basic-components", "1.0.0");
    write_component(&root_a, "button", "A clickable button widget.", "none", None);

    let root_b = tmp.path().join("b");
    write_package(&root_b, "@private/pro-components", "1.0.0");
    write_component(&root_b, "menu", "A clickable navigation widget.", "none", None);

    let svc = service(&tmp.path().join("index"), &root_a).await;
    svc.sync(&sync_request(&root_a)).await.unwrap();
    svc.sync(&sync_request(&root_b)).await.unwrap();

    let rule: component_index::CodegenRule = serde_json::from_str(
        r#"{"type":"ragEnhanced","namespace":"@private/pro-components",
            "searchConfig":{"topK":2}}"#,
    )
    .unwrap();

    let search = svc
        .search_with_rule(&search_request("clickable widget"), &rule)
        .await
        .unwrap();
    assert!(!search.components.is_empty());
    for comp in &search.components {
        assert_eq!(comp.package_name, "@private/pro-components");
    }
}
