use async_trait::async_trait;

use crate::errors::RecallResult;
use crate::models::{NamedQuery, ScoredPoint, VectorPoint};

/// Vector database with named vectors (dense, sparse, multi-vector) per point.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace a point by id.
    async fn upsert(&self, point: VectorPoint) -> RecallResult<()>;

    /// Search one named vector field, best first.
    async fn query(&self, query: &NamedQuery) -> RecallResult<Vec<ScoredPoint>>;
}
