//! Embedding provider interface and text budgeting.
//!
//! Async is required because real providers perform HTTP requests.

pub mod openai;

use std::{future::Future, pin::Pin};

use crate::errors::RciResult;

/// Batched embedding provider.
///
/// Implementations must preserve input order: output index `i` corresponds
/// to input index `i` of the texts that were actually sent.
pub trait Embedder: Send + Sync {
    /// Embeds a batch of texts into fixed-dimension vectors.
    fn embed<'a, 'b>(
        &'a self,
        texts: &'b [String],
    ) -> Pin<Box<dyn Future<Output = RciResult<Vec<Vec<f32>>>> + Send + 'a>>
    where
        'b: 'a;

    /// Vector dimension this provider produces.
    fn dimension(&self) -> usize;
}

/// Static capabilities of an embedding model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub max_tokens: usize,
    pub dimension: usize,
}

impl ModelDescriptor {
    /// Descriptor for a model name; unknown models get the default shape.
    pub fn for_model(model: &str) -> Self {
        match model {
            "text-embedding-3-small" => Self {
                max_tokens: 8192,
                dimension: 1536,
            },
            "text-embedding-3-large" => Self {
                max_tokens: 8192,
                dimension: 3072,
            },
            "text-embedding-ada-002" => Self {
                max_tokens: 8192,
                dimension: 1536,
            },
            _ => Self {
                max_tokens: 8192,
                dimension: 1536,
            },
        }
    }
}

/// Conservative token estimate: ~4 ASCII chars per token, one token per
/// non-ASCII char.
pub fn estimate_tokens(text: &str) -> usize {
    let mut cost = 0.0f64;
    for c in text.chars() {
        cost += if c.is_ascii() { 0.25 } else { 1.0 };
    }
    cost.ceil() as usize
}

/// Truncates `text` so its estimate stays within `max_tokens` minus 10%
/// headroom; truncated output gets a `…` suffix.
pub fn truncate_to_budget(text: &str, max_tokens: usize) -> String {
    let budget = (max_tokens as f64) * 0.9;
    if (estimate_tokens(text) as f64) <= budget {
        return text.to_string();
    }

    let mut cost = 0.0f64;
    let mut out = String::new();
    for c in text.chars() {
        let step = if c.is_ascii() { 0.25 } else { 1.0 };
        if cost + step > budget {
            break;
        }
        cost += step;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_table_is_exhaustive_for_known_models() {
        let small = ModelDescriptor::for_model("text-embedding-3-small");
        assert_eq!(small.dimension, 1536);
        assert_eq!(small.max_tokens, 8192);

        let large = ModelDescriptor::for_model("text-embedding-3-large");
        assert_eq!(large.dimension, 3072);
    }

    #[test]
    fn unknown_models_get_default_shape() {
        let d = ModelDescriptor::for_model("someone-elses-model");
        assert_eq!(d, ModelDescriptor { max_tokens: 8192, dimension: 1536 });
    }

    #[test]
    fn ascii_counts_quarter_token_per_char() {
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn non_ascii_counts_full_token_per_char() {
        assert_eq!(estimate_tokens("日本語"), 3);
        // 4 ascii (1 token) + 2 wide chars
        assert_eq!(estimate_tokens("abcd日本"), 3);
    }

    #[test]
    fn short_text_is_untouched() {
        let text = "short text";
        assert_eq!(truncate_to_budget(text, 8192), text);
    }

    #[test]
    fn long_text_is_truncated_with_ellipsis() {
        let text = "a".repeat(1000);
        // budget: 10 tokens * 0.9 = 9 tokens = 36 ascii chars
        let out = truncate_to_budget(&text, 10);
        assert!(out.ends_with('…'));
        assert_eq!(out.chars().count(), 37);
        assert!(estimate_tokens(out.trim_end_matches('…')) as f64 <= 9.0);
    }

    #[test]
    fn truncation_respects_wide_chars() {
        let text = "語".repeat(100);
        let out = truncate_to_budget(&text, 10);
        assert!(out.ends_with('…'));
        // 9-token budget fits 9 wide chars
        assert_eq!(out.chars().count(), 10);
    }
}
