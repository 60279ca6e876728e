//! Runtime configuration for the index service.
//!
//! Loaded strictly from environment variables in `from_env`, with defaults
//! only where the contract names them. Invalid values fail fast with a
//! typed error instead of being silently coerced.
//!
//! # Environment variables
//!
//! - `RCI_INDEX_PATH`        = backing directory (default `./data/rag-index`)
//! - `RCI_SOURCE_ROOT`       = default component tree for sync (default `./components-src`)
//! - `RCI_DEFAULT_PACKAGE`   = namespace used when `package.json` has no name
//! - `EMBEDDINGS_PROVIDER`   = provider kind (default `openai`)
//! - `EMBEDDINGS_MODEL`      = embedding model (default `text-embedding-3-small`)
//! - `EMBEDDINGS_API_KEY`    = provider credential (required for `openai`)
//! - `EMBEDDINGS_BASE_URL`   = provider endpoint (default `https://api.openai.com`)
//! - `RCI_DIMENSION`         = vector dimension (default: model descriptor)
//! - `RCI_CACHE_ENABLED`     = `true`/`false` (default `true`)
//! - `RCI_CACHE_TTL_SECONDS` = entry TTL (default `300`)
//! - `RCI_CACHE_MAX_SIZE`    = LRU capacity (default `1000`)
//! - `RCI_CACHE_SIMILARITY`  = semantic-tier threshold (default `0.92`)

use std::env;

use crate::embed::ModelDescriptor;
use crate::errors::{RciError, RciResult};

/// Backing store selection; only the file backend is implemented.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Backend kind; `"file"`.
    pub kind: String,
    /// Directory holding `documents.json`, `vectors.json`, `metadata.json`.
    pub path: String,
}

/// Remote embedding provider settings.
#[derive(Clone, Debug)]
pub struct EmbeddingsConfig {
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
}

/// Smart-cache settings.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// When false, cache get/set are no-ops.
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_size: usize,
    /// Cosine threshold for the semantic tier.
    pub similarity_threshold: f32,
}

/// Full configuration of the index service.
#[derive(Clone, Debug)]
pub struct RciConfig {
    pub store: StoreConfig,
    pub embeddings: EmbeddingsConfig,
    /// Vector dimension enforced at store add/search time.
    pub dimension: usize,
    pub cache: CacheConfig,
    /// Default component tree scanned when a sync names no path.
    pub source_root: String,
    /// Namespace used when a source tree's manifest carries no name.
    pub default_package: String,
}

impl RciConfig {
    /// Loads configuration from the environment.
    ///
    /// # Errors
    /// Returns `RciError::Config` on unparseable numeric/boolean values.
    pub fn from_env() -> RciResult<Self> {
        let model = env_or("EMBEDDINGS_MODEL", "text-embedding-3-small");
        let dimension = match env::var("RCI_DIMENSION") {
            Ok(v) => v
                .parse::<usize>()
                .map_err(|_| RciError::Config(format!("RCI_DIMENSION is not a number: {v}")))?,
            Err(_) => ModelDescriptor::for_model(&model).dimension,
        };

        let cfg = Self {
            store: StoreConfig {
                kind: "file".into(),
                path: env_or("RCI_INDEX_PATH", "./data/rag-index"),
            },
            embeddings: EmbeddingsConfig {
                provider: env_or("EMBEDDINGS_PROVIDER", "openai"),
                model,
                api_key: env::var("EMBEDDINGS_API_KEY").ok().filter(|v| !v.is_empty()),
                base_url: env_or("EMBEDDINGS_BASE_URL", "https://api.openai.com"),
            },
            dimension,
            cache: CacheConfig {
                enabled: env_bool("RCI_CACHE_ENABLED", true)?,
                ttl_seconds: env_num("RCI_CACHE_TTL_SECONDS", 300)?,
                max_size: env_num("RCI_CACHE_MAX_SIZE", 1000)?,
                similarity_threshold: env_f32("RCI_CACHE_SIMILARITY", 0.92)?,
            },
            source_root: env_or("RCI_SOURCE_ROOT", "./components-src"),
            default_package: env_or("RCI_DEFAULT_PACKAGE", "@private/basic-components"),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> RciResult<()> {
        if self.store.kind != "file" {
            return Err(RciError::Config(format!(
                "unsupported vector store kind: {}",
                self.store.kind
            )));
        }
        if self.store.path.trim().is_empty() {
            return Err(RciError::Config("store path is empty".into()));
        }
        if self.dimension == 0 {
            return Err(RciError::Config("dimension must be > 0".into()));
        }
        if self.cache.max_size == 0 {
            return Err(RciError::Config("cache max_size must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.cache.similarity_threshold) {
            return Err(RciError::Config(
                "cache similarity threshold must be within [0, 1]".into(),
            ));
        }
        let base = self.embeddings.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(RciError::Config(format!(
                "embeddings base URL must be http(s): {base}"
            )));
        }
        Ok(())
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_bool(name: &str, default: bool) -> RciResult<bool> {
    match env::var(name) {
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(RciError::Config(format!("{name} is not a boolean: {other}"))),
        },
        Err(_) => Ok(default),
    }
}

fn env_num<T: std::str::FromStr>(name: &str, default: T) -> RciResult<T> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| RciError::Config(format!("{name} is not a number: {v}"))),
        Err(_) => Ok(default),
    }
}

fn env_f32(name: &str, default: f32) -> RciResult<f32> {
    env_num::<f32>(name, default)
}
