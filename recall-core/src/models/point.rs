use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store_filter::StoreFilter;
use super::vectors::{EmbeddingVectorSet, MultiVector, SparseVector};

/// Payload stored next to a point's vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    pub content: String,
    pub node_id: String,
    pub session_id: Option<String>,
    /// "code" or "thought".
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub file_path: Option<String>,
}

/// One document as written to the vector store: all named vectors plus payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: String,
    pub vectors: EmbeddingVectorSet,
    pub payload: PointPayload,
}

/// Query-side vector for a single named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryVector {
    Dense(Vec<f32>),
    Sparse(SparseVector),
    Multi(MultiVector),
}

/// A search against one named vector field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedQuery {
    pub vector_name: String,
    pub vector: QueryVector,
    pub filter: Option<StoreFilter>,
    pub limit: usize,
}

/// A hit returned by the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f64,
    pub payload: PointPayload,
}
