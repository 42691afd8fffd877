use serde::{Deserialize, Serialize};

use super::defaults;

/// Multi-vector embedding cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Eviction trigger: total bytes of cached token vectors.
    pub max_size_bytes: usize,
    /// Expiry window measured from entry creation (milliseconds).
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: defaults::DEFAULT_CACHE_MAX_SIZE_BYTES,
            ttl_ms: defaults::DEFAULT_CACHE_TTL_MS,
        }
    }
}
