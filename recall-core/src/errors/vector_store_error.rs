/// Errors surfaced by the external vector store.
#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("upsert failed for point {id}: {reason}")]
    UpsertFailed { id: String, reason: String },

    #[error("query on vector {vector} failed: {reason}")]
    QueryFailed { vector: String, reason: String },

    #[error("unknown named vector: {name}")]
    UnknownVector { name: String },

    #[error("vector store unavailable: {reason}")]
    Unavailable { reason: String },
}
