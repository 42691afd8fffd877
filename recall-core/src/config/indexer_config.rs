use serde::{Deserialize, Serialize};

use super::defaults;

/// Batch indexer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Flush when the buffer holds this many nodes.
    pub batch_size: usize,
    /// Flush when this long has passed since the last flush (milliseconds).
    pub flush_interval_ms: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::DEFAULT_BATCH_SIZE,
            flush_interval_ms: defaults::DEFAULT_FLUSH_INTERVAL_MS,
        }
    }
}
