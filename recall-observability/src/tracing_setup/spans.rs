//! Span definitions per operation: retrieval, embedding, indexing.

/// Create a retrieval span.
#[macro_export]
macro_rules! retrieval_span {
    ($query_id:expr, $strategy:expr) => {
        tracing::info_span!("recall.retrieval", query_id = %$query_id, strategy = ?$strategy)
    };
}

/// Create an embedding span.
#[macro_export]
macro_rules! embedding_span {
    ($model:expr, $role:expr) => {
        tracing::info_span!("recall.embedding", model = %$model, role = %$role)
    };
}

/// Create an indexing span.
#[macro_export]
macro_rules! indexing_span {
    ($node_id:expr, $kind:expr) => {
        tracing::info_span!("recall.indexing", node_id = %$node_id, kind = ?$kind)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const RETRIEVAL: &str = "recall.retrieval";
    pub const EMBEDDING: &str = "recall.embedding";
    pub const INDEXING: &str = "recall.indexing";
}
