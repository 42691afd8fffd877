//! Embedding cache behavior: LRU eviction by bytes, TTL expiry, counters.

use std::sync::Arc;

use proptest::prelude::*;
use recall_core::config::CacheConfig;
use recall_embeddings::cache::{multi_vector_size, EmbeddingCache};
use test_fixtures::ManualClock;

/// `tokens` token vectors of width `dim`, filled with `fill`.
fn mv(tokens: usize, dim: usize, fill: f32) -> Vec<Vec<f32>> {
    vec![vec![fill; dim]; tokens]
}

fn cache(max_size_bytes: usize, ttl_ms: u64) -> (EmbeddingCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let cache = EmbeddingCache::with_clock(
        &CacheConfig {
            max_size_bytes,
            ttl_ms,
        },
        clock.clone(),
    );
    (cache, clock)
}

// ═══════════════════════════════════════════════════════════════════════════
// Basic get / set
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn set_then_get_round_trips() {
    let (cache, _) = cache(1 << 20, 60_000);
    let v = mv(3, 4, 0.5);
    cache.set("doc-1", v.clone());
    assert_eq!(cache.get("doc-1"), Some(v));
}

#[test]
fn size_is_token_len_times_four() {
    let (cache, _) = cache(1 << 20, 60_000);
    cache.set("doc-1", mv(3, 128, 0.1));
    assert_eq!(cache.stats().current_size_bytes, 3 * 128 * 4);
    assert_eq!(multi_vector_size(&mv(2, 10, 0.0)), 80);
}

#[test]
fn miss_on_absent_id() {
    let (cache, _) = cache(1 << 20, 60_000);
    assert!(cache.get("nope").is_none());
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn update_in_place_applies_size_delta() {
    let (cache, _) = cache(1 << 20, 60_000);
    cache.set("doc-1", mv(4, 8, 0.1));
    cache.set("doc-1", mv(2, 8, 0.2));
    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.current_size_bytes, 2 * 8 * 4);
    assert_eq!(cache.get("doc-1"), Some(mv(2, 8, 0.2)));
}

// ═══════════════════════════════════════════════════════════════════════════
// LRU eviction
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn evicts_least_recently_used_when_over_budget() {
    // Each entry is 1 token x 4 dims = 16 bytes; budget fits two.
    let (cache, _) = cache(32, 60_000);
    cache.set("a", mv(1, 4, 1.0));
    cache.set("b", mv(1, 4, 2.0));
    cache.set("c", mv(1, 4, 3.0));

    assert!(cache.get("a").is_none(), "oldest entry should be evicted");
    assert!(cache.get("b").is_some());
    assert!(cache.get("c").is_some());
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn get_refreshes_recency() {
    let (cache, _) = cache(32, 60_000);
    cache.set("a", mv(1, 4, 1.0));
    cache.set("b", mv(1, 4, 2.0));
    cache.get("a");
    cache.set("c", mv(1, 4, 3.0));

    assert!(cache.get("a").is_some(), "touched entry survives");
    assert!(cache.get("b").is_none(), "untouched entry is evicted");
}

#[test]
fn oversized_entry_evicts_everything_then_inserts() {
    let (cache, _) = cache(32, 60_000);
    cache.set("a", mv(1, 4, 1.0));
    cache.set("b", mv(1, 4, 2.0));
    cache.set("huge", mv(4, 4, 9.0));

    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.evictions, 2);
    assert!(cache.get("huge").is_some());
}

// ═══════════════════════════════════════════════════════════════════════════
// TTL
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn expired_entry_is_a_miss_and_is_removed() {
    let (cache, clock) = cache(1 << 20, 1_000);
    cache.set("doc-1", mv(2, 4, 1.0));

    clock.advance(1_000);
    assert!(cache.get("doc-1").is_some(), "age == ttl is still live");

    clock.advance(1);
    assert!(cache.get("doc-1").is_none());
    let stats = cache.stats();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.current_size_bytes, 0);
    assert_eq!(stats.expirations, 1);
}

#[test]
fn ttl_counts_from_creation_not_last_access() {
    let (cache, clock) = cache(1 << 20, 1_000);
    cache.set("doc-1", mv(1, 4, 1.0));
    clock.advance(600);
    assert!(cache.get("doc-1").is_some());
    clock.advance(600);
    assert!(cache.get("doc-1").is_none());
}

#[test]
fn set_resets_creation_time() {
    let (cache, clock) = cache(1 << 20, 1_000);
    cache.set("doc-1", mv(1, 4, 1.0));
    clock.advance(900);
    cache.set("doc-1", mv(1, 4, 2.0));
    clock.advance(900);
    assert_eq!(cache.get("doc-1"), Some(mv(1, 4, 2.0)));
}

// ═══════════════════════════════════════════════════════════════════════════
// Invalidate / clear / stats
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn invalidate_removes_entry_and_bytes() {
    let (cache, _) = cache(1 << 20, 60_000);
    cache.set("doc-1", mv(2, 4, 1.0));
    assert!(cache.invalidate("doc-1"));
    assert!(!cache.invalidate("doc-1"));
    assert_eq!(cache.stats().current_size_bytes, 0);
    assert!(cache.get("doc-1").is_none());
}

#[test]
fn hashed_lookup_requires_matching_content() {
    let (cache, _) = cache(1 << 20, 60_000);
    let original = blake3::hash(b"fn main() {}");
    let edited = blake3::hash(b"fn main() { run() }");
    cache.set_with_hash("doc-1", mv(2, 4, 1.0), original);

    assert_eq!(cache.get_if_hash("doc-1", &original), Some(mv(2, 4, 1.0)));
    assert!(cache.get_if_hash("doc-1", &edited).is_none());
    assert_eq!(cache.stats().entries, 1);

    // Entries written without a hash never satisfy a hashed lookup.
    cache.set("doc-2", mv(1, 4, 1.0));
    assert!(cache.get_if_hash("doc-2", &original).is_none());
    assert!(cache.get("doc-2").is_some());
}

#[test]
fn content_hash_is_evicted_with_its_entry() {
    // Room for exactly one 2x4 multi-vector.
    let (cache, _) = cache(32, 60_000);
    let hash = blake3::hash(b"alpha");
    cache.set_with_hash("a", mv(2, 4, 1.0), hash);
    cache.set_with_hash("b", mv(2, 4, 1.0), blake3::hash(b"beta"));

    assert!(cache.get_if_hash("a", &hash).is_none());
    assert_eq!(cache.stats().entries, 1);
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn content_hash_expires_with_its_entry() {
    let (cache, clock) = cache(1 << 20, 1_000);
    let hash = blake3::hash(b"alpha");
    cache.set_with_hash("a", mv(1, 4, 1.0), hash);
    clock.advance(1_001);
    assert!(cache.get_if_hash("a", &hash).is_none());
    assert_eq!(cache.stats().entries, 0);
    assert_eq!(cache.stats().expirations, 1);
}

#[test]
fn clear_resets_entries_and_counters() {
    let (cache, _) = cache(16, 60_000);
    cache.set("a", mv(1, 4, 1.0));
    cache.set("b", mv(1, 4, 1.0));
    cache.get("b");
    cache.get("zzz");
    cache.clear();

    let stats = cache.stats();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.current_size_bytes, 0);
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.evictions, 0);
    assert_eq!(stats.hit_rate, 0.0);
}

#[test]
fn hit_rate_is_hits_over_lookups() {
    let (cache, _) = cache(1 << 20, 60_000);
    assert_eq!(cache.stats().hit_rate, 0.0);
    cache.set("a", mv(1, 4, 1.0));
    cache.get("a");
    cache.get("a");
    cache.get("a");
    cache.get("missing");
    let stats = cache.stats();
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate - 0.75).abs() < 1e-9);
}

#[test]
fn concurrent_access_keeps_accounting_consistent() {
    let (cache, _) = cache(64 * 16, 60_000);
    let cache = Arc::new(cache);
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    let id = format!("doc-{}", (t * 31 + i) % 100);
                    if i % 3 == 0 {
                        cache.get(&id);
                    } else {
                        cache.set(&id, mv(1 + i % 3, 4, 1.0));
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let stats = cache.stats();
    assert!(stats.current_size_bytes <= stats.max_size_bytes);
}

// ═══════════════════════════════════════════════════════════════════════════
// Property: size accounting
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum Op {
    Set(u8, usize),
    Get(u8),
    Invalidate(u8),
    Advance(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..12, 1usize..6).prop_map(|(k, t)| Op::Set(k, t)),
        (0u8..12).prop_map(Op::Get),
        (0u8..12).prop_map(Op::Invalidate),
        (0u64..400).prop_map(Op::Advance),
    ]
}

proptest! {
    #[test]
    fn current_size_matches_live_entries(ops in proptest::collection::vec(op(), 1..80)) {
        let (cache, clock) = cache(10 * 4 * 4, 1_000);
        let mut model: std::collections::HashMap<u8, usize> = Default::default();

        for op in ops {
            match op {
                Op::Set(k, tokens) => {
                    cache.set(&k.to_string(), mv(tokens, 4, 1.0));
                    model.insert(k, tokens * 16);
                }
                Op::Get(k) => { cache.get(&k.to_string()); }
                Op::Invalidate(k) => { cache.invalidate(&k.to_string()); }
                Op::Advance(ms) => clock.advance(ms as i64),
            }
            let stats = cache.stats();
            // Entries that fit the budget never push it over.
            prop_assert!(stats.current_size_bytes <= stats.max_size_bytes);
            prop_assert!(stats.entries <= model.len());
        }
    }
}
