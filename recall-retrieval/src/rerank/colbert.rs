//! Late-interaction rerank: MaxSim between `[Q]` query tokens and document tokens.

use std::sync::Arc;

use async_trait::async_trait;
use recall_core::errors::RecallResult;
use recall_core::models::{RerankTier, SearchResult};
use recall_embeddings::similarity::max_sim;
use recall_embeddings::{EmbeddingCache, EmbeddingEngine};
use tracing::debug;

use super::{CandidateScore, Reranker};

/// Scores are MaxSim divided by the query token count, so they stay in `[-1, 1]`.
///
/// Document vectors come from the cache when present. A miss is encoded on
/// the spot and not written back; only the indexer populates the cache.
pub struct ColbertReranker {
    embeddings: Arc<EmbeddingEngine>,
    cache: Arc<EmbeddingCache>,
}

impl ColbertReranker {
    pub fn new(embeddings: Arc<EmbeddingEngine>, cache: Arc<EmbeddingCache>) -> Self {
        Self { embeddings, cache }
    }

    async fn score_one(&self, query_tokens: &[Vec<f32>], candidate: &SearchResult) -> CandidateScore {
        let document = match self.cache.get(&candidate.id) {
            Some(mv) => mv,
            None => match self.embeddings.multi_vector().encode_document(&candidate.content).await {
                Ok(mv) => mv,
                Err(e) => return CandidateScore::Failed(e.to_string()),
            },
        };
        match max_sim(query_tokens, &document) {
            Ok(sim) => CandidateScore::Scored(f64::from(sim) / query_tokens.len() as f64),
            Err(e) => CandidateScore::Failed(e.to_string()),
        }
    }
}

#[async_trait]
impl Reranker for ColbertReranker {
    fn tier(&self) -> RerankTier {
        RerankTier::Colbert
    }

    async fn score(&self, query: &str, candidates: &[SearchResult]) -> RecallResult<Vec<CandidateScore>> {
        let query_tokens = self.embeddings.multi_vector().encode_query(query).await?;
        if query_tokens.is_empty() {
            return Ok(vec![CandidateScore::Failed("query has no tokens".to_string()); candidates.len()]);
        }

        let mut scores = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            scores.push(self.score_one(&query_tokens, candidate).await);
        }
        debug!(candidates = candidates.len(), "colbert rerank scored");
        Ok(scores)
    }
}
