//! Cross-encoder rerank over `(query, content)` pairs.

use std::sync::Arc;

use async_trait::async_trait;
use recall_core::errors::{EmbeddingError, RecallResult};
use recall_core::models::{RerankTier, SearchResult};
use recall_core::traits::InferenceBackend;
use recall_embeddings::ModelHandle;
use tracing::debug;

use super::{sigmoid, CandidateScore, Reranker};

/// Relevance is the sigmoid of the model's first output logit.
pub struct CrossEncoderReranker {
    tier: RerankTier,
    handle: Arc<ModelHandle>,
    max_tokens: usize,
}

impl CrossEncoderReranker {
    pub fn new(tier: RerankTier, handle: Arc<ModelHandle>, max_tokens: usize) -> Self {
        Self {
            tier,
            handle,
            max_tokens,
        }
    }

    async fn logit(&self, backend: &dyn InferenceBackend, query: &str, content: &str) -> RecallResult<f32> {
        let input = backend.tokenize_pair(query, content, self.max_tokens)?;
        let output = backend.run(&input).await?;
        match output.data.first() {
            Some(&logit) => Ok(logit),
            None => Err(EmbeddingError::UnexpectedShape {
                shape: output.shape.clone(),
            }
            .into()),
        }
    }
}

#[async_trait]
impl Reranker for CrossEncoderReranker {
    fn tier(&self) -> RerankTier {
        self.tier
    }

    async fn score(&self, query: &str, candidates: &[SearchResult]) -> RecallResult<Vec<CandidateScore>> {
        let backend = self.handle.get().await?;

        let mut scores = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            scores.push(match self.logit(backend.as_ref(), query, &candidate.content).await {
                Ok(logit) => CandidateScore::Scored(sigmoid(logit)),
                Err(e) => CandidateScore::Failed(e.to_string()),
            });
        }
        debug!(tier = %self.tier, candidates = candidates.len(), "cross-encoder rerank scored");
        Ok(scores)
    }
}
