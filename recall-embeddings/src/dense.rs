//! Dense single-vector embeddings for text and code.

use std::sync::Arc;

use recall_core::errors::{EmbeddingError, RecallResult};
use recall_core::models::{DenseVector, DocumentKind, ModelOutput};
use tracing::debug;

use crate::handle::ModelHandle;
use crate::similarity::{l2_normalize, validate_dimensions};

/// Text → fixed-length unit vector.
///
/// The code variant uses its own model, dimension, and named vector. Code
/// longer than its token budget is truncated, not chunked.
pub struct DenseEmbedder {
    handle: Arc<ModelHandle>,
    kind: DocumentKind,
    dimensions: usize,
    max_tokens: usize,
}

impl DenseEmbedder {
    pub fn new(
        handle: Arc<ModelHandle>,
        kind: DocumentKind,
        dimensions: usize,
        max_tokens: usize,
    ) -> Self {
        Self {
            handle,
            kind,
            dimensions,
            max_tokens,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn handle(&self) -> &Arc<ModelHandle> {
        &self.handle
    }

    /// Named vector this embedder writes to.
    pub fn vector_name(&self) -> &'static str {
        self.kind.dense_vector_name()
    }

    pub async fn embed(&self, text: &str) -> RecallResult<Vec<f32>> {
        let backend = self.handle.get().await?;
        let input = backend.tokenize(text, self.max_tokens)?;
        let output = backend.run(&input).await?;

        let mut embedding = mean_pool(&output, &input.attention_mask)?;
        validate_dimensions(&embedding, self.dimensions)?;
        l2_normalize(&mut embedding);

        debug!(
            model = self.handle.model_id(),
            kind = ?self.kind,
            tokens = input.len(),
            "dense embedding computed"
        );
        Ok(embedding)
    }

    /// Embed and tag with the named vector field.
    pub async fn embed_tagged(&self, text: &str) -> RecallResult<DenseVector> {
        Ok(DenseVector {
            field: self.vector_name().to_string(),
            values: self.embed(text).await?,
        })
    }
}

/// Mean over attended positions for `[1, seq, dim]`, passthrough for `[1, dim]`.
///
/// Positions beyond the mask count as attended.
pub fn mean_pool(output: &ModelOutput, attention_mask: &[u32]) -> RecallResult<Vec<f32>> {
    if output.data.len() != output.element_count() {
        return Err(unexpected(output));
    }
    match output.shape.as_slice() {
        [1, seq, dims] => {
            let (seq, dims) = (*seq, *dims);
            let mut pooled = vec![0.0f32; dims];
            let mut attended = 0usize;
            for s in 0..seq {
                if attention_mask.get(s).is_some_and(|&m| m == 0) {
                    continue;
                }
                attended += 1;
                let row = &output.data[s * dims..(s + 1) * dims];
                for (acc, v) in pooled.iter_mut().zip(row) {
                    *acc += v;
                }
            }
            if attended > 0 {
                for v in &mut pooled {
                    *v /= attended as f32;
                }
            }
            Ok(pooled)
        }
        [1, dims] => Ok(output.data[..*dims].to_vec()),
        _ => Err(unexpected(output)),
    }
}

fn unexpected(output: &ModelOutput) -> recall_core::RecallError {
    EmbeddingError::UnexpectedShape {
        shape: output.shape.clone(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_pool_skips_masked_positions() {
        let output = ModelOutput::new(vec![1, 3, 2], vec![1.0, 2.0, 3.0, 4.0, 100.0, 100.0]);
        let pooled = mean_pool(&output, &[1, 1, 0]).unwrap();
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn mean_pool_passes_through_pooled_output() {
        let output = ModelOutput::new(vec![1, 3], vec![0.1, 0.2, 0.3]);
        assert_eq!(mean_pool(&output, &[1]).unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn mean_pool_rejects_batched_output() {
        let output = ModelOutput::new(vec![2, 1, 2], vec![0.0; 4]);
        assert!(mean_pool(&output, &[1]).is_err());
    }

    #[test]
    fn mean_pool_rejects_short_data() {
        let output = ModelOutput::new(vec![1, 2, 2], vec![0.0; 3]);
        assert!(mean_pool(&output, &[1, 1]).is_err());
    }
}
