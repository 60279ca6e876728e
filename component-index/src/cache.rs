//! Two-tier smart cache over search responses.
//!
//! Exact tier: `md5(lower(trim(query)) || canonicalJSON(filters))` → entry,
//! with LRU eviction (a hit moves the key to the tail, eviction pops the
//! head). Semantic tier: insertion-ordered keys of entries stored with a
//! query embedding, matched by cosine similarity against a threshold.
//! Entries expire after `max_age` and are dropped at the next access.
//!
//! All state lives in memory behind a `std::sync::Mutex`; cache operations
//! are never suspension points.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use md5::{Digest, Md5};
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::record::{CacheStats, SearchFilters, SearchResponse};
use crate::similarity::cosine;

struct CacheEntry {
    response: SearchResponse,
    embedding: Option<Vec<f32>>,
    created_at: Instant,
    last_accessed: Instant,
    hit_count: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// LRU order; front is the eviction candidate.
    order: VecDeque<String>,
    /// Keys carrying an embedding, in insertion order.
    semantic: Vec<String>,
    hits: u64,
    misses: u64,
}

/// LRU + semantic cache for repeated or near-duplicate queries.
pub struct SmartCache {
    enabled: bool,
    max_size: usize,
    max_age: Duration,
    similarity_threshold: f32,
    inner: Mutex<CacheInner>,
}

impl SmartCache {
    pub fn new(cfg: &CacheConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            max_size: cfg.max_size.max(1),
            max_age: Duration::from_secs(cfg.ttl_seconds),
            similarity_threshold: cfg.similarity_threshold,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Looks up a response: exact key first, then the semantic tier when a
    /// query embedding is given.
    pub fn get(
        &self,
        query: &str,
        embedding: Option<&[f32]>,
        filters: Option<&SearchFilters>,
    ) -> Option<SearchResponse> {
        if !self.enabled {
            return None;
        }

        let key = exact_key(query, filters);
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("cache mutex poisoned");

        let exact = inner
            .entries
            .get(&key)
            .map(|entry| now.duration_since(entry.created_at) <= self.max_age);
        match exact {
            Some(true) => {
                let response = {
                    let entry = inner.entries.get_mut(&key).expect("entry just seen");
                    entry.last_accessed = now;
                    entry.hit_count += 1;
                    entry.response.clone()
                };
                touch(&mut inner.order, &key);
                inner.hits += 1;
                trace!(%key, "exact cache hit");
                return Some(response);
            }
            Some(false) => remove_key(&mut inner, &key),
            None => {}
        }

        if let Some(qv) = embedding {
            let mut matched: Option<(String, SearchResponse)> = None;
            let mut expired: Vec<String> = Vec::new();

            for sem_key in &inner.semantic {
                let Some(entry) = inner.entries.get(sem_key) else {
                    continue;
                };
                if now.duration_since(entry.created_at) > self.max_age {
                    expired.push(sem_key.clone());
                    continue;
                }
                let Some(stored) = entry.embedding.as_deref() else {
                    continue;
                };
                let Ok(score) = cosine(qv, stored) else {
                    continue;
                };
                if score >= self.similarity_threshold {
                    matched = Some((sem_key.clone(), entry.response.clone()));
                    break;
                }
            }

            for key in expired {
                remove_key(&mut inner, &key);
            }
            if let Some((sem_key, response)) = matched {
                if let Some(entry) = inner.entries.get_mut(&sem_key) {
                    entry.last_accessed = now;
                    entry.hit_count += 1;
                }
                touch(&mut inner.order, &sem_key);
                inner.hits += 1;
                debug!("semantic cache hit");
                return Some(response);
            }
        }

        inner.misses += 1;
        None
    }

    /// Stores a response; evicts the oldest-inserted entry when full.
    pub fn set(
        &self,
        query: &str,
        response: SearchResponse,
        embedding: Option<Vec<f32>>,
        filters: Option<&SearchFilters>,
    ) {
        if !self.enabled {
            return;
        }

        let key = exact_key(query, filters);
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("cache mutex poisoned");

        if inner.entries.contains_key(&key) {
            remove_key(&mut inner, &key);
        } else if inner.entries.len() >= self.max_size {
            if let Some(oldest) = inner.order.front().cloned() {
                remove_key(&mut inner, &oldest);
            }
        }

        let has_embedding = embedding.is_some();
        inner.entries.insert(
            key.clone(),
            CacheEntry {
                response,
                embedding,
                created_at: now,
                last_accessed: now,
                hit_count: 0,
            },
        );
        inner.order.push_back(key.clone());
        if has_embedding {
            inner.semantic.push(key);
        }
    }

    /// Empties both tiers; cumulative hit/miss counters persist.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.entries.clear();
        inner.order.clear();
        inner.semantic.clear();
        debug!("cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        let now = Instant::now();

        let total_queries = inner.hits + inner.misses;
        let hit_rate = if total_queries == 0 {
            0.0
        } else {
            inner.hits as f64 / total_queries as f64
        };
        let avg_response_time = if inner.entries.is_empty() {
            0.0
        } else {
            inner
                .entries
                .values()
                .map(|e| e.response.duration as f64)
                .sum::<f64>()
                / inner.entries.len() as f64
        };
        let oldest_entry = inner
            .entries
            .values()
            .map(|e| now.duration_since(e.created_at).as_millis() as u64)
            .max()
            .unwrap_or(0);

        CacheStats {
            size: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
            avg_response_time,
            oldest_entry,
            total_queries,
        }
    }
}

/// Moves `key` to the LRU tail.
fn touch(order: &mut VecDeque<String>, key: &str) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        order.remove(pos);
    }
    order.push_back(key.to_string());
}

fn remove_key(inner: &mut CacheInner, key: &str) {
    inner.entries.remove(key);
    if let Some(pos) = inner.order.iter().position(|k| k == key) {
        inner.order.remove(pos);
    }
    inner.semantic.retain(|k| k != key);
}

/// Exact cache key: md5 over the normalized query and canonical filters.
fn exact_key(query: &str, filters: Option<&SearchFilters>) -> String {
    let canonical = match filters {
        Some(f) => serde_json::to_string(f).unwrap_or_default(),
        None => "null".to_string(),
    };
    let mut hasher = Md5::new();
    hasher.update(query.trim().to_lowercase().as_bytes());
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}
