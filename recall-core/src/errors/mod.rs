//! Error taxonomy. One enum per subsystem, aggregated into [`RecallError`].

mod embedding_error;
mod indexing_error;
mod retrieval_error;
mod vector_store_error;

pub use embedding_error::EmbeddingError;
pub use indexing_error::IndexingError;
pub use retrieval_error::RetrievalError;
pub use vector_store_error::VectorStoreError;

/// Top-level error for every Recall crate.
#[derive(Debug, thiserror::Error)]
pub enum RecallError {
    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("retrieval error: {0}")]
    RetrievalError(#[from] RetrievalError),

    #[error("vector store error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("indexing error: {0}")]
    IndexingError(#[from] IndexingError),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type RecallResult<T> = Result<T, RecallError>;
