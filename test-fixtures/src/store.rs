//! In-memory vector store with qdrant-style named vectors and filters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recall_core::constants::{DENSE_CODE_VECTOR, DENSE_TEXT_VECTOR, MULTI_VECTOR, SPARSE_VECTOR};
use recall_core::errors::{RecallResult, VectorStoreError};
use recall_core::models::{
    FieldCondition, NamedQuery, PointPayload, QueryVector, ScoredPoint, StoreFilter, VectorPoint,
};
use recall_core::traits::VectorStore;

#[derive(Default)]
pub struct InMemoryVectorStore {
    points: RwLock<HashMap<String, VectorPoint>>,
    upserts: AtomicUsize,
    queries: AtomicUsize,
    fail_upserts: AtomicBool,
    fail_queries: AtomicBool,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<VectorPoint> {
        self.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, VectorPoint>> {
        self.points.read().unwrap_or_else(|e| e.into_inner())
    }

    fn score(point: &VectorPoint, query: &NamedQuery) -> RecallResult<Option<f64>> {
        let name = query.vector_name.as_str();
        let mismatch = || VectorStoreError::QueryFailed {
            vector: name.to_string(),
            reason: "query vector kind does not match the named vector".to_string(),
        };
        match (name, &query.vector) {
            (DENSE_TEXT_VECTOR | DENSE_CODE_VECTOR, QueryVector::Dense(q)) => {
                let dense = &point.vectors.dense;
                if dense.field != name {
                    return Ok(None);
                }
                if dense.values.len() != q.len() {
                    return Err(VectorStoreError::QueryFailed {
                        vector: name.to_string(),
                        reason: format!(
                            "dimension mismatch: stored {}, query {}",
                            dense.values.len(),
                            q.len()
                        ),
                    }
                    .into());
                }
                Ok(Some(dot(&dense.values, q)))
            }
            (SPARSE_VECTOR, QueryVector::Sparse(q)) => {
                let s = point.vectors.sparse.dot(q) as f64;
                Ok((s > 0.0).then_some(s))
            }
            (MULTI_VECTOR, QueryVector::Multi(q)) => {
                let doc = &point.vectors.multi_vector;
                let total: f64 = q
                    .iter()
                    .map(|qt| {
                        doc.iter()
                            .map(|dt| dot(qt, dt))
                            .fold(f64::NEG_INFINITY, f64::max)
                    })
                    .filter(|m| m.is_finite())
                    .sum();
                Ok(Some(total))
            }
            (DENSE_TEXT_VECTOR | DENSE_CODE_VECTOR | SPARSE_VECTOR | MULTI_VECTOR, _) => {
                Err(mismatch().into())
            }
            _ => Err(VectorStoreError::UnknownVector {
                name: name.to_string(),
            }
            .into()),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum()
}

fn field_value(payload: &PointPayload, key: &str) -> Option<String> {
    match key {
        "node_id" => Some(payload.node_id.clone()),
        "session_id" => payload.session_id.clone(),
        "type" => Some(payload.kind.clone()),
        "file_path" => payload.file_path.clone(),
        "content" => Some(payload.content.clone()),
        _ => None,
    }
}

fn timestamp_of(payload: &PointPayload, key: &str) -> Option<DateTime<Utc>> {
    match key {
        "timestamp" | "valid_time" => payload.timestamp,
        _ => None,
    }
}

fn parse_bound(bound: &Option<String>) -> Option<Option<DateTime<Utc>>> {
    match bound {
        None => Some(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| Some(t.with_timezone(&Utc))),
    }
}

fn condition_holds(payload: &PointPayload, cond: &FieldCondition) -> bool {
    if let Some(m) = &cond.match_value {
        if field_value(payload, &cond.key).as_deref() != Some(m.value.as_str()) {
            return false;
        }
    }
    if let Some(range) = &cond.range {
        let Some(t) = timestamp_of(payload, &cond.key) else {
            return false;
        };
        let (Some(gte), Some(lte)) = (parse_bound(&range.gte), parse_bound(&range.lte)) else {
            return false;
        };
        if gte.is_some_and(|g| t < g) || lte.is_some_and(|l| t > l) {
            return false;
        }
    }
    true
}

/// Whether `payload` satisfies every clause of `filter`.
pub fn filter_matches(payload: &PointPayload, filter: &StoreFilter) -> bool {
    filter.must.iter().all(|c| condition_holds(payload, c))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, point: VectorPoint) -> RecallResult<()> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(VectorStoreError::UpsertFailed {
                id: point.id,
                reason: "store configured to fail".to_string(),
            }
            .into());
        }
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.points
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(point.id.clone(), point);
        Ok(())
    }

    async fn query(&self, query: &NamedQuery) -> RecallResult<Vec<ScoredPoint>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(VectorStoreError::Unavailable {
                reason: "store configured to fail".to_string(),
            }
            .into());
        }

        let points = self.read();
        let mut hits = Vec::new();
        for point in points.values() {
            if let Some(filter) = &query.filter {
                if !filter_matches(&point.payload, filter) {
                    continue;
                }
            }
            if let Some(score) = Self::score(point, query)? {
                hits.push(ScoredPoint {
                    id: point.id.clone(),
                    score,
                    payload: point.payload.clone(),
                });
            }
        }
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(query.limit);
        Ok(hits)
    }
}
