//! SPLADE sparse embeddings.
//!
//! Pooling: `log(1 + relu(logit))` per vocabulary term, max over attended
//! positions, terms at or below the noise threshold dropped.

use std::sync::Arc;

use recall_core::constants::SPLADE_NOISE_THRESHOLD;
use recall_core::errors::{EmbeddingError, RecallResult};
use recall_core::models::{ModelOutput, SparseVector};
use tracing::debug;

use crate::handle::ModelHandle;

/// Text → vocabulary-indexed sparse vector. Queries and documents share the pipeline.
pub struct SparseEmbedder {
    handle: Arc<ModelHandle>,
    max_tokens: usize,
}

impl SparseEmbedder {
    pub fn new(handle: Arc<ModelHandle>, max_tokens: usize) -> Self {
        Self { handle, max_tokens }
    }

    pub fn handle(&self) -> &Arc<ModelHandle> {
        &self.handle
    }

    pub async fn embed(&self, text: &str) -> RecallResult<SparseVector> {
        let backend = self.handle.get().await?;
        let input = backend.tokenize(text, self.max_tokens)?;
        let output = backend.run(&input).await?;
        let sparse = splade_pool(&output, &input.attention_mask)?;

        debug!(
            model = self.handle.model_id(),
            tokens = input.len(),
            terms = sparse.len(),
            "sparse embedding computed"
        );
        Ok(sparse)
    }
}

/// Pool MLM logits of shape `[batch, seq, vocab]` into a sparse vector.
///
/// Only `batch == 1` is accepted. The mask must have one entry per position;
/// positions with mask 0 never contribute. Output indices are ascending and
/// every value is finite and above [`SPLADE_NOISE_THRESHOLD`].
pub fn splade_pool(logits: &ModelOutput, attention_mask: &[u32]) -> RecallResult<SparseVector> {
    let [batch, seq, vocab] = logits.shape.as_slice() else {
        return Err(EmbeddingError::UnexpectedShape {
            shape: logits.shape.clone(),
        }
        .into());
    };
    let (batch, seq, vocab) = (*batch, *seq, *vocab);

    if batch != 1 {
        return Err(EmbeddingError::InvalidSparseInput { batch_size: batch }.into());
    }
    if attention_mask.len() != seq {
        return Err(EmbeddingError::DimensionMismatch {
            expected: seq,
            actual: attention_mask.len(),
        }
        .into());
    }
    if logits.data.len() != seq * vocab {
        return Err(EmbeddingError::UnexpectedShape {
            shape: logits.shape.clone(),
        }
        .into());
    }

    // log1p(relu(x)) >= 0, so 0.0 is a safe identity for the max.
    let mut pooled = vec![0.0f32; vocab];
    for (p, &mask) in attention_mask.iter().enumerate() {
        if mask == 0 {
            continue;
        }
        let row = &logits.data[p * vocab..(p + 1) * vocab];
        for (acc, &x) in pooled.iter_mut().zip(row) {
            let activated = x.max(0.0).ln_1p();
            if activated > *acc {
                *acc = activated;
            }
        }
    }

    let mut indices = Vec::new();
    let mut values = Vec::new();
    for (term, &weight) in pooled.iter().enumerate() {
        if weight.is_finite() && weight > SPLADE_NOISE_THRESHOLD {
            indices.push(term as u32);
            values.push(weight);
        }
    }
    Ok(SparseVector::new(indices, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pool_takes_max_over_positions() {
        // seq=2, vocab=3
        let logits = ModelOutput::new(vec![1, 2, 3], vec![1.0, -2.0, 0.0, 3.0, 0.5, 0.0]);
        let sv = splade_pool(&logits, &[1, 1]).unwrap();
        assert_eq!(sv.indices, vec![0, 1]);
        assert!((sv.values[0] - 3.0f32.ln_1p()).abs() < 1e-6);
        assert!((sv.values[1] - 0.5f32.ln_1p()).abs() < 1e-6);
    }

    #[test]
    fn masked_positions_never_contribute() {
        let logits = ModelOutput::new(vec![1, 2, 2], vec![0.0, 1.0, 50.0, 0.0]);
        let sv = splade_pool(&logits, &[1, 0]).unwrap();
        assert_eq!(sv.indices, vec![1]);
    }

    #[test]
    fn noise_below_threshold_is_dropped() {
        let logits = ModelOutput::new(vec![1, 1, 2], vec![1e-7, 2.0]);
        let sv = splade_pool(&logits, &[1]).unwrap();
        assert_eq!(sv.indices, vec![1]);
    }

    #[test]
    fn infinite_logits_are_dropped() {
        let logits = ModelOutput::new(vec![1, 1, 2], vec![f32::INFINITY, 2.0]);
        let sv = splade_pool(&logits, &[1]).unwrap();
        assert_eq!(sv.indices, vec![1]);
    }

    #[test]
    fn batch_larger_than_one_is_rejected() {
        let logits = ModelOutput::new(vec![2, 1, 2], vec![1.0; 4]);
        let err = splade_pool(&logits, &[1]).unwrap_err();
        assert!(matches!(
            err,
            recall_core::RecallError::EmbeddingError(EmbeddingError::InvalidSparseInput {
                batch_size: 2
            })
        ));
    }

    #[test]
    fn mask_length_must_match_sequence() {
        let logits = ModelOutput::new(vec![1, 2, 2], vec![1.0; 4]);
        assert!(splade_pool(&logits, &[1]).is_err());
    }

    #[test]
    fn all_non_positive_logits_give_empty_vector() {
        let logits = ModelOutput::new(vec![1, 2, 3], vec![-1.0, 0.0, -3.0, 0.0, -0.5, -9.0]);
        assert!(splade_pool(&logits, &[1, 1]).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn pooled_output_is_sorted_positive_and_in_vocab(
            seq in 1usize..6,
            vocab in 1usize..40,
            seed in proptest::collection::vec(-20.0f32..20.0, 240),
            mask_bits in proptest::collection::vec(0u32..2, 6),
        ) {
            let data: Vec<f32> = seed.iter().cycle().take(seq * vocab).copied().collect();
            let mask = &mask_bits[..seq];
            let sv = splade_pool(&ModelOutput::new(vec![1, seq, vocab], data), mask).unwrap();

            prop_assert_eq!(sv.indices.len(), sv.values.len());
            prop_assert!(sv.indices.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(sv.indices.iter().all(|&i| (i as usize) < vocab));
            prop_assert!(sv.values.iter().all(|v| v.is_finite() && *v > SPLADE_NOISE_THRESHOLD));
            if mask.iter().all(|&m| m == 0) {
                prop_assert!(sv.is_empty());
            }
        }
    }
}
