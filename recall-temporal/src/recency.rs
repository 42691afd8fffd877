//! Recency boost: `score + factor * exp(-age_days / 30)`.

use chrono::{DateTime, Utc};
use recall_core::models::SearchResult;

/// Decay constant of the recency weight, in days.
pub const RECENCY_DECAY_DAYS: f64 = 30.0;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Weight in `(0, 1]`, strictly decreasing with age. Future times weigh 1.
pub fn recency_weight(valid_time: DateTime<Utc>, reference: DateTime<Utc>) -> f64 {
    let age_days = ((reference - valid_time).num_milliseconds() as f64 / MS_PER_DAY).max(0.0);
    (-age_days / RECENCY_DECAY_DAYS).exp()
}

/// Boost each result with a valid time, then re-sort descending.
///
/// Results without a valid time keep their score. Ties keep their order.
pub fn apply_recency_boost(
    mut results: Vec<SearchResult>,
    reference: DateTime<Utc>,
    boost_factor: f64,
) -> Vec<SearchResult> {
    for result in &mut results {
        if let Some(valid_time) = result.valid_time {
            result.score += boost_factor * recency_weight(valid_time, reference);
        }
    }
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}
