//! Multi-vector embedding cache.
//!
//! Keyed by document id. Bounded by total bytes of token vectors (LRU
//! eviction) and by entry age (TTL from creation). Expired entries count as
//! absent and are dropped when a lookup finds them. An entry may carry the
//! hash of the content it was encoded from; the hash leaves with the entry.

pub mod lru;

use std::sync::{Arc, Mutex, MutexGuard};

use recall_core::config::CacheConfig;
use recall_core::constants::BYTES_PER_FLOAT;
use recall_core::models::MultiVector;
use recall_core::traits::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use lru::LruIndex;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub multi_vector: MultiVector,
    pub size_bytes: usize,
    pub created_at_ms: i64,
    pub last_accessed_at_ms: i64,
    pub content_hash: Option<blake3::Hash>,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub current_size_bytes: usize,
    pub max_size_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// `hits / (hits + misses)`, 0 before any lookup.
    pub hit_rate: f64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: LruIndex<CacheEntry>,
    current_size_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

pub struct EmbeddingCache {
    state: Mutex<CacheState>,
    max_size_bytes: usize,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
}

/// Bytes a multi-vector occupies: one float per token dimension.
pub fn multi_vector_size(mv: &MultiVector) -> usize {
    mv.iter().map(|t| t.len() * BYTES_PER_FLOAT).sum()
}

impl EmbeddingCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_size_bytes: config.max_size_bytes,
            ttl_ms: config.ttl_ms,
            clock,
        }
    }

    /// Cached multi-vector for `id`. A hit refreshes recency.
    pub fn get(&self, id: &str) -> Option<MultiVector> {
        self.lookup(id, |_| true)
    }

    /// Like [`get`](Self::get), but only hits when the entry was stored with
    /// `content_hash`. A different or missing hash counts as a miss.
    pub fn get_if_hash(&self, id: &str, content_hash: &blake3::Hash) -> Option<MultiVector> {
        self.lookup(id, |entry| entry.content_hash.as_ref() == Some(content_hash))
    }

    fn lookup<F>(&self, id: &str, current: F) -> Option<MultiVector>
    where
        F: Fn(&CacheEntry) -> bool,
    {
        let now = self.clock.now_ms();
        let mut guard = self.lock();
        let state = &mut *guard;

        let (expired, stale) = match state.entries.peek(id) {
            None => {
                state.misses += 1;
                debug!(id, "embedding cache miss");
                return None;
            }
            Some(entry) => (self.is_expired(entry, now), !current(entry)),
        };

        if expired {
            if let Some(entry) = state.entries.remove(id) {
                state.current_size_bytes -= entry.size_bytes;
            }
            state.expirations += 1;
            state.misses += 1;
            debug!(id, "embedding cache entry expired");
            return None;
        }
        if stale {
            state.misses += 1;
            debug!(id, "embedding cache entry has different content");
            return None;
        }

        state.entries.touch(id);
        state.hits += 1;
        let entry = state.entries.peek_mut(id)?;
        entry.last_accessed_at_ms = now;
        debug!(id, "embedding cache hit");
        Some(entry.multi_vector.clone())
    }

    /// Store `mv` under `id`, evicting least recently used entries to stay in budget.
    pub fn set(&self, id: &str, mv: MultiVector) {
        self.insert(id, mv, None);
    }

    /// [`set`](Self::set), remembering the hash of the content `mv` encodes.
    pub fn set_with_hash(&self, id: &str, mv: MultiVector, content_hash: blake3::Hash) {
        self.insert(id, mv, Some(content_hash));
    }

    fn insert(&self, id: &str, mv: MultiVector, content_hash: Option<blake3::Hash>) {
        let now = self.clock.now_ms();
        let size_bytes = multi_vector_size(&mv);
        let mut guard = self.lock();
        let state = &mut *guard;

        let entry = CacheEntry {
            multi_vector: mv,
            size_bytes,
            created_at_ms: now,
            last_accessed_at_ms: now,
            content_hash,
        };

        if state.entries.contains(id) {
            if let Some(old) = state.entries.insert(id.to_string(), entry) {
                state.current_size_bytes -= old.size_bytes;
            }
            state.current_size_bytes += size_bytes;
            // The updated entry is now most recent, so only others are evicted.
            while state.current_size_bytes > self.max_size_bytes && state.entries.len() > 1 {
                Self::evict_one(state);
            }
            return;
        }

        while state.current_size_bytes + size_bytes > self.max_size_bytes
            && !state.entries.is_empty()
        {
            Self::evict_one(state);
        }
        state.entries.insert(id.to_string(), entry);
        state.current_size_bytes += size_bytes;
    }

    /// Drop `id`. Returns whether it was present.
    pub fn invalidate(&self, id: &str) -> bool {
        let mut state = self.lock();
        match state.entries.remove(id) {
            Some(entry) => {
                state.current_size_bytes -= entry.size_bytes;
                true
            }
            None => false,
        }
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let mut state = self.lock();
        *state = CacheState::default();
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let lookups = state.hits + state.misses;
        CacheStats {
            entries: state.entries.len(),
            current_size_bytes: state.current_size_bytes,
            max_size_bytes: self.max_size_bytes,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            expirations: state.expirations,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                state.hits as f64 / lookups as f64
            },
        }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }

    fn is_expired(&self, entry: &CacheEntry, now: i64) -> bool {
        now.saturating_sub(entry.created_at_ms) > self.ttl_ms as i64
    }

    fn evict_one(state: &mut CacheState) {
        if let Some((key, entry)) = state.entries.pop_lru() {
            state.current_size_bytes -= entry.size_bytes;
            state.evictions += 1;
            debug!(id = %key, size = entry.size_bytes, "embedding cache eviction");
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
