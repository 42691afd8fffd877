//! Merging dense and sparse hit lists for hybrid search.
//!
//! Both methods weight the dense list by `alpha` and the sparse list by
//! `1 - alpha`. A point missing from one list gets nothing from it.

use std::cmp::Ordering;
use std::collections::HashMap;

use recall_core::models::ScoredPoint;

/// Min-max normalize into `[0, 1]`. A constant non-empty list maps to all ones.
pub fn min_max_normalize(scores: &[f64]) -> Vec<f64> {
    let (min, max) = scores
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    let range = max - min;
    scores
        .iter()
        .map(|&s| if range > f64::EPSILON { (s - min) / range } else { 1.0 })
        .collect()
}

/// `alpha * norm(dense) + (1 - alpha) * norm(sparse)`.
pub fn weighted_sum_fusion(
    dense: Vec<ScoredPoint>,
    sparse: Vec<ScoredPoint>,
    alpha: f64,
) -> Vec<ScoredPoint> {
    let mut fused = Accumulator::default();
    for (list, weight) in [(dense, alpha), (sparse, 1.0 - alpha)] {
        let raw: Vec<f64> = list.iter().map(|p| p.score).collect();
        for (point, norm) in list.into_iter().zip(min_max_normalize(&raw)) {
            fused.add(point, weight * norm);
        }
    }
    fused.into_ranked()
}

/// Weighted reciprocal rank fusion: `Σ weight / (k + rank)`, ranks from 1.
pub fn reciprocal_rank_fusion(
    dense: Vec<ScoredPoint>,
    sparse: Vec<ScoredPoint>,
    alpha: f64,
    k: u32,
) -> Vec<ScoredPoint> {
    let mut fused = Accumulator::default();
    for (list, weight) in [(dense, alpha), (sparse, 1.0 - alpha)] {
        for (rank, point) in list.into_iter().enumerate() {
            let contribution = weight / (k as f64 + rank as f64 + 1.0);
            fused.add(point, contribution);
        }
    }
    fused.into_ranked()
}

/// Sort best first; ties break on id so output is deterministic.
pub fn sort_points(points: &mut [ScoredPoint]) {
    points.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[derive(Default)]
struct Accumulator {
    points: HashMap<String, ScoredPoint>,
}

impl Accumulator {
    fn add(&mut self, point: ScoredPoint, contribution: f64) {
        self.points
            .entry(point.id.clone())
            .and_modify(|p| p.score += contribution)
            .or_insert(ScoredPoint {
                score: contribution,
                ..point
            });
    }

    fn into_ranked(self) -> Vec<ScoredPoint> {
        let mut points: Vec<ScoredPoint> = self.points.into_values().collect();
        sort_points(&mut points);
        points
    }
}
