use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use recall_core::config::RecallConfig;
use recall_core::errors::{RecallError, RecallResult, RetrievalError};
use recall_core::models::{
    EmbeddingVectorSet, IndexableNode, PointPayload, RerankTier, SearchQuery, SearchResult,
    SearchStrategy, TimeRange, VectorPoint,
};
use recall_core::traits::{BackendLoader, VectorStore};
use recall_embeddings::{EmbeddingCache, EmbeddingEngine, EngineLoaders};
use recall_retrieval::{CandidateScore, Reranker, RetrievalEngine};
use test_fixtures::nodes::{node_at, session_node, text_node};
use test_fixtures::{FailingLoader, HashingLoader, InMemoryVectorStore, ManualClock};

const DIM: usize = 16;
const MV_DIM: usize = 8;

// ═══════════════════════════════════════════════════════════════════════════
// Harness
// ═══════════════════════════════════════════════════════════════════════════

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn config() -> RecallConfig {
    let mut config = RecallConfig::default();
    config.embedding.text_dimensions = DIM;
    config.embedding.code_dimensions = DIM;
    config.embedding.multi_vector_dimensions = MV_DIM;
    config
}

struct Harness {
    embeddings: Arc<EmbeddingEngine>,
    cache: Arc<EmbeddingCache>,
    store: Arc<InMemoryVectorStore>,
    engine: RetrievalEngine,
}

fn harness_with_text_loader(text: Arc<dyn BackendLoader>) -> Harness {
    let config = config();
    let loaders = EngineLoaders {
        text,
        code: Arc::new(HashingLoader::new("code", DIM)),
        sparse: Arc::new(HashingLoader::splade("splade")),
        multi_vector: Arc::new(HashingLoader::new("colbert", MV_DIM)),
    };
    let embeddings = Arc::new(EmbeddingEngine::with_loaders(&config.embedding, loaders));
    let cache = Arc::new(EmbeddingCache::new(&config.cache));
    let store = Arc::new(InMemoryVectorStore::new());
    let engine = RetrievalEngine::new(
        &config,
        Arc::clone(&embeddings),
        Arc::clone(&cache),
        Arc::clone(&store) as Arc<dyn VectorStore>,
    )
    .with_clock(Arc::new(ManualClock::new(reference().timestamp_millis())));
    Harness {
        embeddings,
        cache,
        store,
        engine,
    }
}

fn harness() -> Harness {
    harness_with_text_loader(Arc::new(HashingLoader::new("text", DIM)))
}

impl Harness {
    /// Write `node` the way the indexer would, without touching the cache.
    async fn seed(&self, node: IndexableNode) {
        let kind = node.kind();
        let content = node.content_for(kind).to_string();
        let vectors = EmbeddingVectorSet {
            dense: self.embeddings.embed_dense(kind, &content).await.unwrap(),
            sparse: self.embeddings.sparse().embed(&content).await.unwrap(),
            multi_vector: self
                .embeddings
                .multi_vector()
                .encode_document(&content)
                .await
                .unwrap(),
        };
        let point = VectorPoint {
            id: node.id.clone(),
            vectors,
            payload: PointPayload {
                content,
                node_id: node.id.clone(),
                session_id: node.session_id.clone(),
                kind: kind.payload_type().to_string(),
                timestamp: node.timestamp,
                file_path: node.file_path.clone(),
            },
        };
        self.store.upsert(point).await.unwrap();
    }

    async fn seed_all(&self, nodes: Vec<IndexableNode>) {
        for node in nodes {
            self.seed(node).await;
        }
    }
}

fn ids(results: &[SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.id.as_str()).collect()
}

/// Scores candidates by a fixed table; ids not in the table fail.
struct TableReranker {
    scores: Vec<(&'static str, f64)>,
}

#[async_trait]
impl Reranker for TableReranker {
    fn tier(&self) -> RerankTier {
        RerankTier::Llm
    }

    async fn score(
        &self,
        _query: &str,
        candidates: &[SearchResult],
    ) -> RecallResult<Vec<CandidateScore>> {
        Ok(candidates
            .iter()
            .map(|c| match self.scores.iter().find(|(id, _)| *id == c.id) {
                Some((_, s)) => CandidateScore::Scored(*s),
                None => CandidateScore::Failed(format!("no score for {}", c.id)),
            })
            .collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Strategy and fusion
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn natural_language_query_finds_matching_document() {
    let h = harness();
    h.seed_all(vec![
        text_node("auth", "login flow validates session tokens"),
        text_node("db", "database migration script for postgres"),
        text_node("ui", "button colors in the settings page"),
    ])
    .await;

    let response = h.engine.search(&SearchQuery::new("login flow")).await.unwrap();
    assert_eq!(response.classification.strategy, SearchStrategy::Hybrid);
    assert_eq!(response.classification.alpha, 0.7);
    assert_eq!(response.results[0].id, "auth");
    assert!(!response.degraded);
    assert!(response.temporal.is_none());
}

#[tokio::test]
async fn quoted_query_searches_sparse_only() {
    let h = harness();
    h.seed_all(vec![
        text_node("exact", "retry budget exceeded"),
        text_node("other", "cache warmup"),
    ])
    .await;

    let response = h
        .engine
        .search(&SearchQuery::new(r#"find "retry budget""#))
        .await
        .unwrap();
    assert_eq!(response.classification.strategy, SearchStrategy::Sparse);
    assert_eq!(h.store.query_count(), 1);
    assert_eq!(ids(&response.results), ["exact"]);
}

#[tokio::test]
async fn strategy_override_is_honoured() {
    let h = harness();
    h.seed(text_node("a", "vector search internals")).await;

    let query = SearchQuery::new("vector search").with_strategy(SearchStrategy::Dense);
    let response = h.engine.search(&query).await.unwrap();
    assert_eq!(response.classification.alpha, 1.0);
    assert_eq!(h.store.query_count(), 1);
    assert_eq!(response.results.len(), 1);
}

#[tokio::test]
async fn limit_truncates_results() {
    let h = harness();
    h.seed_all(
        (0..6)
            .map(|i| text_node(&format!("n{i}"), &format!("deploy notes part {i}")))
            .collect(),
    )
    .await;

    let response = h
        .engine
        .search(&SearchQuery::new("deploy notes").with_limit(2))
        .await
        .unwrap();
    assert_eq!(response.results.len(), 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// Filters and time
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn temporal_phrase_filters_and_is_stripped() {
    let h = harness();
    let yesterday = reference() - Duration::days(1);
    h.seed_all(vec![
        node_at("fresh", "login changes merged", yesterday),
        node_at("stale", "login changes merged", reference() - Duration::days(40)),
    ])
    .await;

    let response = h
        .engine
        .search(&SearchQuery::new("login changes yesterday"))
        .await
        .unwrap();
    assert_eq!(response.semantic_query, "login changes");
    assert_eq!(response.temporal.as_ref().unwrap().expression, "yesterday");
    assert_eq!(ids(&response.results), ["fresh"]);
    assert_eq!(response.results[0].valid_time, Some(yesterday));
}

#[tokio::test]
async fn explicit_time_range_overrides_parsed_window() {
    let h = harness();
    h.seed_all(vec![
        node_at("june", "release checklist", reference() - Duration::days(2)),
        node_at("jan", "release checklist", Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()),
    ])
    .await;

    let mut query = SearchQuery::new("release checklist yesterday");
    query.filters.time_range = Some(TimeRange {
        after: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        before: Some(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()),
    });
    let response = h.engine.search(&query).await.unwrap();
    assert_eq!(ids(&response.results), ["jan"]);
}

#[tokio::test]
async fn recency_intent_orders_equal_matches_newest_first() {
    let h = harness();
    h.seed_all(vec![
        node_at("old", "incident report", reference() - Duration::days(60)),
        node_at("new", "incident report", reference() - Duration::days(1)),
        node_at("mid", "incident report", reference() - Duration::days(10)),
    ])
    .await;

    let response = h
        .engine
        .search(&SearchQuery::new("latest incident report"))
        .await
        .unwrap();
    assert!(response.temporal.as_ref().unwrap().sort_by_recency);
    assert_eq!(ids(&response.results), ["new", "mid", "old"]);
    assert!(response.results[0].score > response.results[0].base_score);
}

#[tokio::test]
async fn session_filter_restricts_results() {
    let h = harness();
    h.seed_all(vec![
        session_node("mine", "refactor the parser", "s1"),
        session_node("theirs", "refactor the parser", "s2"),
    ])
    .await;

    let response = h
        .engine
        .search(&SearchQuery::new("refactor the parser").with_session("s1"))
        .await
        .unwrap();
    assert_eq!(ids(&response.results), ["mine"]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Reranking
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn colbert_rerank_scores_without_populating_cache() {
    let h = harness();
    h.seed_all(vec![
        text_node("a", "token bucket rate limiter"),
        text_node("b", "rate limiter configuration"),
    ])
    .await;

    let query = SearchQuery::new("rate limiter").with_rerank(RerankTier::Colbert, 10);
    let response = h.engine.search(&query).await.unwrap();

    assert!(!response.degraded);
    assert!(response.degradation_events.is_empty());
    for r in &response.results {
        assert!((-1.0..=1.0).contains(&r.score), "score {}", r.score);
    }
    assert_eq!(h.cache.stats().entries, 0);
}

#[tokio::test]
async fn colbert_rerank_prefers_cached_vectors() {
    let h = harness();
    h.seed(text_node("a", "rate limiter")).await;
    let query_tokens = h.embeddings.multi_vector().encode_query("rate limiter").await.unwrap();
    // Cached vectors identical to the query tokens give a perfect MaxSim.
    h.cache.set("a", query_tokens);

    let query = SearchQuery::new("rate limiter").with_rerank(RerankTier::Colbert, 5);
    let response = h.engine.search(&query).await.unwrap();
    assert!((response.results[0].score - 1.0).abs() < 1e-5);
    assert_eq!(h.cache.stats().hits, 1);
}

#[tokio::test]
async fn missing_tier_degrades_every_candidate() {
    let h = harness();
    h.seed_all(vec![
        text_node("a", "parser error recovery"),
        text_node("b", "parser error messages"),
    ])
    .await;

    let query = SearchQuery::new("parser error").with_rerank(RerankTier::Accurate, 10);
    let response = h.engine.search(&query).await.unwrap();

    assert!(response.degraded);
    assert!(response.results.iter().all(|r| r.degraded));
    assert_eq!(response.degradation_events.len(), 1);
    assert_eq!(response.degradation_events[0].component, "rerank.accurate");
    assert_eq!(h.engine.degradations().len(), 1);
}

#[tokio::test]
async fn failed_candidate_keeps_base_score_others_are_rescored() {
    let mut h = harness();
    h.seed_all(vec![
        text_node("a", "queue backpressure"),
        text_node("b", "queue backpressure tuning"),
        text_node("c", "queue backpressure metrics"),
    ])
    .await;
    h.engine.register_reranker(Arc::new(TableReranker {
        scores: vec![("a", 0.05), ("c", 2.0)],
    }));

    let query = SearchQuery::new("queue backpressure").with_rerank(RerankTier::Llm, 10);
    let response = h.engine.search(&query).await.unwrap();

    let by_id = |id: &str| response.results.iter().find(|r| r.id == id).unwrap();
    assert_eq!(by_id("c").score, 2.0);
    assert!(!by_id("c").degraded);
    assert!(by_id("b").degraded);
    assert_eq!(by_id("b").score, by_id("b").base_score);
    assert_eq!(response.results[0].id, "c");
    assert_eq!(response.degradation_events.len(), 1);
}

#[tokio::test]
async fn rerank_depth_leaves_tail_untouched() {
    let mut h = harness();
    h.seed_all(
        (0..4)
            .map(|i| text_node(&format!("n{i}"), &format!("cache eviction note {i}")))
            .collect(),
    )
    .await;
    h.engine.register_reranker(Arc::new(TableReranker {
        scores: vec![("n0", 5.0), ("n1", 5.0), ("n2", 5.0), ("n3", 5.0)],
    }));

    let query = SearchQuery::new("cache eviction").with_rerank(RerankTier::Llm, 2);
    let response = h.engine.search(&query).await.unwrap();
    assert_eq!(response.results.len(), 4);
    assert!(response.results[..2].iter().all(|r| r.score == 5.0));
    assert!(response.results[2..].iter().all(|r| r.score == r.base_score));
}

// ═══════════════════════════════════════════════════════════════════════════
// Failures and logging
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn empty_query_is_rejected() {
    let h = harness();
    let err = h.engine.search(&SearchQuery::new("   ")).await.unwrap_err();
    assert!(matches!(
        err,
        RecallError::RetrievalError(RetrievalError::InvalidQuery { .. })
    ));
}

#[tokio::test]
async fn store_failure_fails_the_query() {
    let h = harness();
    h.seed(text_node("a", "anything")).await;
    h.store.fail_queries(true);
    assert!(h.engine.search(&SearchQuery::new("anything")).await.is_err());
    assert_eq!(h.engine.query_log().count(), 0);
}

#[tokio::test]
async fn embedding_load_failure_fails_the_query() {
    let h = harness_with_text_loader(Arc::new(FailingLoader::new("text", "model missing")));
    let err = h
        .engine
        .search(&SearchQuery::new("how to implement login"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("model missing"));
}

#[tokio::test]
async fn successful_queries_are_logged() {
    let h = harness();
    h.seed(text_node("a", "graph traversal")).await;
    let response = h
        .engine
        .search(&SearchQuery::new("graph traversal"))
        .await
        .unwrap();

    let log = h.engine.query_log();
    let entry = log.last().unwrap();
    assert_eq!(entry.query_id, response.query_id);
    assert_eq!(entry.result_count, 1);
    assert_eq!(entry.strategy, SearchStrategy::Hybrid);
    assert_eq!(entry.timestamp_epoch_ms, reference().timestamp_millis());
}
