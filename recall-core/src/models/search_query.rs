use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classification::SearchStrategy;
use super::rerank::RerankTier;

/// Explicit time bounds supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub session_id: Option<String>,
    /// "code" or "thought".
    pub content_type: Option<String>,
    pub time_range: Option<TimeRange>,
}

/// A single search request. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub text: String,
    pub filters: SearchFilters,
    /// Bypasses the classifier when set.
    pub strategy: Option<SearchStrategy>,
    pub rerank: Option<bool>,
    pub rerank_tier: Option<RerankTier>,
    pub rerank_depth: Option<usize>,
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_rerank(mut self, tier: RerankTier, depth: usize) -> Self {
        self.rerank = Some(true);
        self.rerank_tier = Some(tier);
        self.rerank_depth = Some(depth);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.filters.session_id = Some(session_id.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.filters.content_type = Some(content_type.into());
        self
    }
}
