/// Embedding subsystem errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmbeddingError {
    #[error("backend load failed: {model}: {reason}")]
    BackendLoadFailed { model: String, reason: String },

    #[error("inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("vectors must have the same length: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid sparse input: batch size {batch_size}, only 1 is supported")]
    InvalidSparseInput { batch_size: usize },

    #[error("unexpected output shape: {shape:?}")]
    UnexpectedShape { shape: Vec<usize> },
}
