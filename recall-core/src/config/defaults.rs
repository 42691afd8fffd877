// Single source of truth for all default values.

// --- Embeddings ---
pub const DEFAULT_TEXT_DIMENSIONS: usize = 384;
pub const DEFAULT_CODE_DIMENSIONS: usize = 768;
pub const DEFAULT_MULTI_VECTOR_DIMENSIONS: usize = 128;
pub const DEFAULT_MAX_TOKENS: usize = 512;
pub const DEFAULT_CODE_MAX_TOKENS: usize = 1024;
pub const DEFAULT_INTRA_THREADS: usize = 2;

// --- Cache ---
pub const DEFAULT_CACHE_MAX_SIZE_BYTES: usize = 1 << 30; // 1 GiB
pub const DEFAULT_CACHE_TTL_MS: u64 = 3_600_000; // 1 hour

// --- Indexer ---
pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5_000;

// --- Retrieval ---
pub const DEFAULT_RERANK_ENABLED: bool = false;
pub const DEFAULT_RERANK_DEPTH: usize = 20;
pub const DEFAULT_RESULT_LIMIT: usize = 10;
pub const DEFAULT_RECENCY_BOOST_FACTOR: f64 = 0.2;
pub const DEFAULT_RRF_K: u32 = 60;
pub const DEFAULT_TEMPORAL_FIELD: &str = "timestamp";

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_QUERY_LOG_CAPACITY: usize = 10_000;
