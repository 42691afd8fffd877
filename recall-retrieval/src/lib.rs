//! # recall-retrieval
//!
//! Turns a [`SearchQuery`](recall_core::SearchQuery) into ranked results:
//!
//! ```text
//! query ─┬─ classifier ──────── strategy + alpha
//!        └─ temporal parser ─── window + recency intent + residual text
//!             │
//!             ▼
//!   embed residual (dense / sparse) → store query per named vector
//!             │
//!             ▼
//!   fusion (weighted sum | RRF) → recency boost → rerank tier → limit
//! ```

pub mod classifier;
pub mod engine;
pub mod fusion;
pub mod rerank;

pub use classifier::{classify, resolve_strategy};
pub use engine::RetrievalEngine;
pub use fusion::{min_max_normalize, reciprocal_rank_fusion, weighted_sum_fusion};
pub use rerank::{CandidateScore, Reranker, RerankerRegistry};
