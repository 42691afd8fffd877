//! # recall-indexer
//!
//! - [`SearchIndexer`]: computes every vector for one node and upserts it
//! - [`BatchIndexer`]: buffers nodes and flushes by size, timer, or shutdown

pub mod batch;
pub mod search_indexer;

use async_trait::async_trait;
use recall_core::errors::RecallResult;
use recall_core::models::IndexableNode;
use serde::{Deserialize, Serialize};

pub use batch::{BatchIndexer, BatchStats, FlushReport, FlushTrigger};
pub use search_indexer::SearchIndexer;

/// What happened to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOutcome {
    Indexed,
    /// Nothing to embed. Not an error.
    SkippedEmpty,
}

/// Indexes a single node. The batch indexer drives one of these.
#[async_trait]
pub trait NodeIndexer: Send + Sync {
    async fn index_node(&self, node: &IndexableNode) -> RecallResult<IndexOutcome>;
}
