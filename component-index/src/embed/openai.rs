//! OpenAI-compatible embedding provider.
//!
//! Thin client for `POST {endpoint}/v1/embeddings` with batching, linear
//! retry backoff, and a non-retryable fast path for auth and quota
//! failures. The `endpoint` must start with `https://` or `http://` to
//! allow self-hosted gateways.

use std::time::Duration;

use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::EmbeddingsConfig;
use crate::embed::{truncate_to_budget, Embedder, ModelDescriptor};
use crate::errors::{RciError, RciResult};

/// Provider-side cap on texts per call.
const MAX_BATCH: usize = 100;
/// Rate-limit floor between successive batches.
const BATCH_PAUSE: Duration = Duration::from_millis(100);
/// Attempts per batch before giving up.
const MAX_ATTEMPTS: u32 = 3;

/// Remote embedder speaking the OpenAI embeddings wire format.
#[derive(Debug)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url_embeddings: String,
    model: String,
    descriptor: ModelDescriptor,
    dimension: usize,
    retry_delay: Duration,
}

impl OpenAiEmbedder {
    /// Builds an embedder from provider settings.
    ///
    /// # Errors
    /// - [`RciError::Config`] on a missing API key or invalid endpoint
    /// - [`RciError::Embedding`] if the HTTP client cannot be built
    pub fn new(cfg: &EmbeddingsConfig, dimension: usize) -> RciResult<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| RciError::Config("missing embeddings API key".into()))?;

        let endpoint = cfg.base_url.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(RciError::Config(format!(
                "invalid embeddings endpoint: {}",
                cfg.base_url
            )));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| RciError::Config(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| RciError::Embedding(e.to_string()))?;

        let base = endpoint.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            url_embeddings: format!("{base}/v1/embeddings"),
            model: cfg.model.clone(),
            descriptor: ModelDescriptor::for_model(&cfg.model),
            dimension,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// One provider call for a single batch; retried by [`Self::embed_batch`].
    async fn call(&self, inputs: &[String]) -> RciResult<Vec<Vec<f32>>> {
        let body = EmbeddingsRequest {
            model: &self.model,
            input: inputs,
        };

        debug!("POST {} ({} texts)", self.url_embeddings, inputs.len());
        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await
            .map_err(|e| RciError::Embedding(format!("transport error: {e}")))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(RciError::AuthFailed);
        }

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            if text.to_lowercase().contains("quota") {
                return Err(RciError::QuotaExceeded);
            }
            let snippet = text.chars().take(240).collect::<String>();
            return Err(RciError::Embedding(format!(
                "unexpected HTTP status {status}: {snippet}"
            )));
        }

        let out: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| RciError::Embedding(format!("failed to decode response: {e}")))?;

        let vectors = sort_by_index(out.data);
        if vectors.len() != inputs.len() {
            return Err(RciError::Embedding(format!(
                "provider returned {} vectors for {} inputs",
                vectors.len(),
                inputs.len()
            )));
        }
        for v in &vectors {
            if v.len() != self.dimension {
                return Err(RciError::VectorSizeMismatch {
                    got: v.len(),
                    want: self.dimension,
                });
            }
        }
        Ok(vectors)
    }

    /// Calls the provider with linear backoff; auth and quota failures are
    /// surfaced immediately.
    async fn embed_batch(&self, inputs: &[String]) -> RciResult<Vec<Vec<f32>>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.call(inputs).await {
                Ok(v) => return Ok(v),
                Err(e @ (RciError::AuthFailed | RciError::QuotaExceeded)) => return Err(e),
                Err(e) if attempt >= MAX_ATTEMPTS => return Err(e),
                Err(e) => {
                    warn!(attempt, error = %e, "embedding batch failed; retrying");
                    tokio::time::sleep(self.retry_delay * attempt).await;
                }
            }
        }
    }

    #[instrument(skip_all, fields(model = %self.model, texts = texts.len()))]
    async fn embed_all(&self, texts: &[String]) -> RciResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let kept: Vec<String> = texts
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| truncate_to_budget(t, self.descriptor.max_tokens))
            .collect();
        if kept.is_empty() {
            return Err(RciError::Embedding("empty input".into()));
        }

        let mut out = Vec::with_capacity(kept.len());
        for (i, chunk) in kept.chunks(MAX_BATCH).enumerate() {
            if i > 0 {
                tokio::time::sleep(BATCH_PAUSE).await;
            }
            out.extend(self.embed_batch(chunk).await?);
        }
        Ok(out)
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed<'a, 'b>(
        &'a self,
        texts: &'b [String],
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = RciResult<Vec<Vec<f32>>>> + Send + 'a>,
    >
    where
        'b: 'a,
    {
        Box::pin(self.embed_all(texts))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Orders response items by their provider-side index so output order
/// matches input order.
fn sort_by_index(mut data: Vec<EmbeddingItem>) -> Vec<Vec<f32>> {
    data.sort_by_key(|item| item.index);
    data.into_iter().map(|item| item.embedding).collect()
}

/// Request body for `/v1/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response body for `/v1/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(api_key: Option<&str>, base_url: &str) -> EmbeddingsConfig {
        EmbeddingsConfig {
            provider: "openai".into(),
            model: "text-embedding-3-small".into(),
            api_key: api_key.map(str::to_string),
            base_url: base_url.into(),
        }
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let err = OpenAiEmbedder::new(&cfg(None, "https://api.openai.com"), 1536).unwrap_err();
        assert!(matches!(err, RciError::Config(_)));
    }

    #[test]
    fn non_http_endpoint_is_rejected() {
        let err = OpenAiEmbedder::new(&cfg(Some("sk-test"), "ftp://nope"), 1536).unwrap_err();
        assert!(matches!(err, RciError::Config(_)));
    }

    #[test]
    fn endpoint_trailing_slash_is_normalized() {
        let e = OpenAiEmbedder::new(&cfg(Some("sk-test"), "https://api.openai.com/"), 1536)
            .unwrap();
        assert_eq!(e.url_embeddings, "https://api.openai.com/v1/embeddings");
    }

    #[test]
    fn response_items_are_sorted_by_index() {
        let data = vec![
            EmbeddingItem {
                index: 2,
                embedding: vec![2.0],
            },
            EmbeddingItem {
                index: 0,
                embedding: vec![0.0],
            },
            EmbeddingItem {
                index: 1,
                embedding: vec![1.0],
            },
        ];
        let sorted = sort_by_index(data);
        assert_eq!(sorted, vec![vec![0.0], vec![1.0], vec![2.0]]);
    }
}
