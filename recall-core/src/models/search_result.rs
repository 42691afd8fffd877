use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classification::ClassificationResult;
use super::degradation_event::DegradationEvent;
use super::point::{PointPayload, ScoredPoint};
use super::temporal_filter::TemporalFilter;

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub content: String,
    /// Final score after boosting and reranking.
    pub score: f64,
    /// Score as returned by retrieval, before boosting or reranking.
    pub base_score: f64,
    pub valid_time: Option<DateTime<Utc>>,
    pub payload: PointPayload,
    /// Reranking failed for this result; `score` fell back to the pre-rerank score.
    pub degraded: bool,
}

impl From<ScoredPoint> for SearchResult {
    fn from(point: ScoredPoint) -> Self {
        Self {
            id: point.id,
            content: point.payload.content.clone(),
            score: point.score,
            base_score: point.score,
            valid_time: point.payload.timestamp,
            payload: point.payload,
            degraded: false,
        }
    }
}

/// Everything the orchestrator decided and found for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query_id: String,
    pub results: Vec<SearchResult>,
    pub classification: ClassificationResult,
    pub temporal: Option<TemporalFilter>,
    /// Query text with temporal phrasing removed.
    pub semantic_query: String,
    /// True when any result is degraded.
    pub degraded: bool,
    pub degradation_events: Vec<DegradationEvent>,
}
