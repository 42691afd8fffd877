use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time window and recency intent extracted from a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalFilter {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    /// The phrase that produced this filter.
    pub expression: String,
    pub sort_by_recency: bool,
}

impl TemporalFilter {
    pub fn has_bounds(&self) -> bool {
        self.after.is_some() || self.before.is_some()
    }

    /// Whether `t` falls inside the (inclusive) window.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.after.map_or(true, |a| t >= a) && self.before.map_or(true, |b| t <= b)
    }
}

/// Output of temporal parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalParse {
    pub filter: Option<TemporalFilter>,
    /// The query with the matched temporal phrase removed.
    pub semantic_query: String,
    /// 0 when nothing temporal was recognized.
    pub confidence: f64,
}
