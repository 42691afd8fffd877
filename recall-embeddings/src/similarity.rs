//! Vector similarity and normalization helpers.
//!
//! Every comparison checks lengths first and fails with `DimensionMismatch`
//! instead of silently truncating to the shorter vector.

use recall_core::errors::{EmbeddingError, RecallResult};

/// Fail unless `embedding` has exactly `expected` dimensions.
pub fn validate_dimensions(embedding: &[f32], expected: usize) -> RecallResult<()> {
    if embedding.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        }
        .into());
    }
    Ok(())
}

/// Scale to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> RecallResult<f32> {
    validate_dimensions(b, a.len())?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Cosine similarity. Returns 0 when either side is a zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> RecallResult<f32> {
    let d = dot(a, b)?;
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na <= f32::EPSILON || nb <= f32::EPSILON {
        return Ok(0.0);
    }
    Ok(d / (na * nb))
}

/// ColBERT late interaction: for each query token, the best dot product
/// against any document token, summed over query tokens.
///
/// An empty document scores 0.
pub fn max_sim(query: &[Vec<f32>], document: &[Vec<f32>]) -> RecallResult<f32> {
    let mut total = 0.0f32;
    for q in query {
        let mut best = f32::NEG_INFINITY;
        for d in document {
            best = best.max(dot(q, d)?);
        }
        if best > f32::NEG_INFINITY {
            total += best;
        }
    }
    Ok(total)
}
