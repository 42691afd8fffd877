/// Recall system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Named vector field for dense text embeddings.
pub const DENSE_TEXT_VECTOR: &str = "text-dense";

/// Named vector field for dense code embeddings.
pub const DENSE_CODE_VECTOR: &str = "code-dense";

/// Named vector field for SPLADE sparse embeddings.
pub const SPARSE_VECTOR: &str = "sparse";

/// Named vector field for ColBERT token embeddings.
pub const MULTI_VECTOR: &str = "colbert";

/// Role marker prepended to documents before multi-vector encoding.
pub const DOCUMENT_MARKER: &str = "[D]";

/// Role marker prepended to queries before multi-vector encoding.
pub const QUERY_MARKER: &str = "[Q]";

/// Bytes per stored float, used for cache accounting.
pub const BYTES_PER_FLOAT: usize = 4;

/// Pooled SPLADE weights at or below this value are numerical noise.
pub const SPLADE_NOISE_THRESHOLD: f32 = 1e-5;

/// Node labels that mark code-bearing content.
pub const CODE_LABELS: &[&str] = &["CodeDiff", "CodeChange", "CodeSnippet", "Code", "File"];

/// Payload field holding a document's valid time.
pub const VALID_TIME_FIELD: &str = "valid_time";

/// Payload field the indexer writes document timestamps under.
pub const PAYLOAD_TIMESTAMP_FIELD: &str = "timestamp";
