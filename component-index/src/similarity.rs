//! Cosine similarity over dense vectors.

use crate::errors::{RciError, RciResult};

/// Cosine similarity: `dot(a, b) / (‖a‖·‖b‖)`.
///
/// Returns 0 when either vector has zero norm. A length mismatch is an
/// error, never a score.
pub fn cosine(a: &[f32], b: &[f32]) -> RciResult<f32> {
    if a.len() != b.len() {
        return Err(RciError::VectorSizeMismatch {
            got: b.len(),
            want: a.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_similarity_is_one() {
        let v = vec![0.3f32, -0.5, 0.8, 0.1];
        let s = cosine(&v, &v).unwrap();
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        let v = vec![0.2f32, 0.4];
        let z = vec![0.0f32, 0.0];
        assert_eq!(cosine(&v, &z).unwrap(), 0.0);
        assert_eq!(cosine(&z, &z).unwrap(), 0.0);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = vec![1.0f32, 0.0];
        let b = vec![0.0f32, 1.0];
        assert!(cosine(&a, &b).unwrap().abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let a = vec![1.0f32, 2.0];
        let b = vec![-1.0f32, -2.0];
        assert!((cosine(&a, &b).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let a = vec![1.0f32, 2.0];
        let b = vec![1.0f32, 2.0, 3.0];
        assert!(matches!(
            cosine(&a, &b),
            Err(RciError::VectorSizeMismatch { got: 3, want: 2 })
        ));
    }
}
