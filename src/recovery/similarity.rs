//! Cosine similarity scorer

use crate::error::SimilarityError;

/// Cosine similarity `dot(a, b) / (|a| * |b|)`, accumulated in f64.
///
/// Zero-norm and non-finite inputs are rejected rather than producing NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Err(SimilarityError::DegenerateEmbedding);
    }

    let score = dot / denom;
    if !score.is_finite() {
        return Err(SimilarityError::DegenerateEmbedding);
    }

    Ok(score.clamp(-1.0, 1.0) as f32)
}

/// True when the vector has a non-zero, finite L2 norm
pub fn has_direction(v: &[f32]) -> bool {
    let norm: f64 = v.iter().map(|&x| (x as f64) * (x as f64)).sum();
    norm > 0.0 && norm.is_finite()
}
