use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::{FusionMethod, RerankTier};

/// Retrieval subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Rerank when the query does not say.
    pub rerank_enabled: bool,
    /// Default rerank tier.
    pub rerank_tier: RerankTier,
    /// Number of top candidates considered for reranking.
    pub rerank_depth: usize,
    /// Results returned when the query sets no limit.
    pub default_limit: usize,
    /// Weight of the recency term when boosting.
    pub recency_boost_factor: f64,
    /// How dense and sparse result lists are combined.
    pub fusion: FusionMethod,
    /// RRF k-value when `fusion = "rrf"`.
    pub rrf_k: u32,
    /// Payload field the temporal range filter targets.
    pub temporal_field: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rerank_enabled: defaults::DEFAULT_RERANK_ENABLED,
            rerank_tier: RerankTier::default(),
            rerank_depth: defaults::DEFAULT_RERANK_DEPTH,
            default_limit: defaults::DEFAULT_RESULT_LIMIT,
            recency_boost_factor: defaults::DEFAULT_RECENCY_BOOST_FACTOR,
            fusion: FusionMethod::default(),
            rrf_k: defaults::DEFAULT_RRF_K,
            temporal_field: defaults::DEFAULT_TEMPORAL_FIELD.to_string(),
        }
    }
}
