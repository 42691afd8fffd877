/// Retrieval subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("search failed: {reason}")]
    SearchFailed { reason: String },

    #[error("rerank failed for tier {tier}: {reason}")]
    RerankFailed { tier: String, reason: String },

    #[error("no reranker registered for tier {tier}")]
    RerankerUnavailable { tier: String },

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },
}
