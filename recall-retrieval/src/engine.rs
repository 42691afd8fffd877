//! RetrievalEngine: classify → temporal parse → embed → store query → fuse →
//! recency boost → rerank → limit.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Utc};
use recall_core::config::{RecallConfig, RetrievalConfig};
use recall_core::constants::SPARSE_VECTOR;
use recall_core::errors::{RecallResult, RetrievalError};
use recall_core::models::{
    ClassificationResult, DocumentKind, FieldCondition, FusionMethod, NamedQuery, QueryVector,
    RerankTier, ScoredPoint, SearchQuery, SearchResponse, SearchResult, SearchStrategy,
    StoreFilter, TemporalFilter, TimeRange,
};
use recall_core::traits::{Clock, SystemClock, VectorStore};
use recall_embeddings::{EmbeddingCache, EmbeddingEngine};
use recall_observability::{DegradationTracker, QueryLog, QueryLogEntry, TrackedDegradation};
use recall_temporal::{apply_recency_boost, build_temporal_filter_on};
use tracing::{debug, info, Instrument};
use uuid::Uuid;

use crate::classifier::resolve_strategy;
use crate::fusion::{reciprocal_rank_fusion, weighted_sum_fusion};
use crate::rerank::{component_name, rerank_top, RerankOutcome, Reranker, RerankerRegistry};

/// Rerank settings after applying per-query overrides.
#[derive(Debug, Clone, Copy)]
struct RerankPlan {
    tier: RerankTier,
    depth: usize,
}

pub struct RetrievalEngine {
    embeddings: Arc<EmbeddingEngine>,
    store: Arc<dyn VectorStore>,
    rerankers: RerankerRegistry,
    config: RetrievalConfig,
    clock: Arc<dyn Clock>,
    query_log: Mutex<QueryLog>,
    degradations: Mutex<DegradationTracker>,
}

impl RetrievalEngine {
    /// Engine with the ColBERT tier plus any configured cross-encoder tiers.
    pub fn new(
        config: &RecallConfig,
        embeddings: Arc<EmbeddingEngine>,
        cache: Arc<EmbeddingCache>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let rerankers =
            RerankerRegistry::from_config(&config.embedding, Arc::clone(&embeddings), cache);
        Self {
            embeddings,
            store,
            rerankers,
            config: config.retrieval.clone(),
            clock: Arc::new(SystemClock),
            query_log: Mutex::new(QueryLog::with_capacity(
                config.observability.query_log_capacity,
            )),
            degradations: Mutex::new(DegradationTracker::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Add or replace the reranker for its tier (e.g. a caller-supplied `llm` tier).
    pub fn register_reranker(&mut self, reranker: Arc<dyn Reranker>) {
        self.rerankers.register(reranker);
    }

    pub fn rerankers(&self) -> &RerankerRegistry {
        &self.rerankers
    }

    /// Copy of the query log.
    pub fn query_log(&self) -> QueryLog {
        lock(&self.query_log).clone()
    }

    /// Every degradation recorded so far, oldest first.
    pub fn degradations(&self) -> Vec<TrackedDegradation> {
        lock(&self.degradations).events().cloned().collect()
    }

    /// Run one query end to end.
    ///
    /// Embedding and store failures fail the query. Rerank failures only
    /// degrade the affected results.
    pub async fn search(&self, query: &SearchQuery) -> RecallResult<SearchResponse> {
        if query.text.trim().is_empty() {
            return Err(RetrievalError::InvalidQuery {
                reason: "query text is empty".to_string(),
            }
            .into());
        }

        let started = Instant::now();
        let query_id = Uuid::new_v4().to_string();
        let classification = resolve_strategy(query);
        let span = recall_observability::retrieval_span!(query_id, classification.strategy);

        let (response, plan) = self
            .execute(query, query_id, classification)
            .instrument(span)
            .await?;
        self.log_query(query, &response, plan, started);
        Ok(response)
    }

    async fn execute(
        &self,
        query: &SearchQuery,
        query_id: String,
        classification: ClassificationResult,
    ) -> RecallResult<(SearchResponse, Option<RerankPlan>)> {
        let now = self.now();
        let parsed = recall_temporal::parse(&query.text, now);
        let temporal = effective_temporal(parsed.filter, query.filters.time_range.as_ref());
        let filter = self.store_filter(query, temporal.as_ref());

        let kind = match query.filters.content_type.as_deref() {
            Some(t) if t == DocumentKind::Code.payload_type() => DocumentKind::Code,
            _ => DocumentKind::Text,
        };
        let text = if parsed.semantic_query.is_empty() {
            query.text.trim()
        } else {
            parsed.semantic_query.as_str()
        };

        let limit = query.limit.unwrap_or(self.config.default_limit).max(1);
        let plan = query
            .rerank
            .unwrap_or(self.config.rerank_enabled)
            .then(|| RerankPlan {
                tier: query.rerank_tier.unwrap_or(self.config.rerank_tier),
                depth: query.rerank_depth.unwrap_or(self.config.rerank_depth),
            });
        let fetch = plan.map_or(limit, |p| limit.max(p.depth));

        let points = self.retrieve(text, kind, classification, filter, fetch).await?;
        debug!(candidates = points.len(), ?kind, "store returned candidates");
        let mut results: Vec<SearchResult> = points.into_iter().map(SearchResult::from).collect();

        if temporal.as_ref().is_some_and(|t| t.sort_by_recency) {
            results = apply_recency_boost(results, now, self.config.recency_boost_factor);
        }

        let mut degradation_events = Vec::new();
        if let Some(plan) = plan {
            let outcome = rerank_top(&self.rerankers, plan.tier, text, results, plan.depth, now).await;
            self.track(plan.tier, &outcome, now);
            degradation_events = outcome.events;
            results = outcome.results;
        }

        results.truncate(limit);
        let degraded = results.iter().any(|r| r.degraded);

        info!(
            strategy = ?classification.strategy,
            alpha = classification.alpha,
            results = results.len(),
            temporal = temporal.is_some(),
            degraded,
            "search complete"
        );

        let response = SearchResponse {
            query_id,
            results,
            classification,
            temporal,
            semantic_query: parsed.semantic_query,
            degraded,
            degradation_events,
        };
        Ok((response, plan))
    }

    async fn retrieve(
        &self,
        text: &str,
        kind: DocumentKind,
        classification: ClassificationResult,
        filter: Option<StoreFilter>,
        limit: usize,
    ) -> RecallResult<Vec<ScoredPoint>> {
        match classification.strategy {
            SearchStrategy::Dense => self.dense_hits(text, kind, filter, limit).await,
            SearchStrategy::Sparse => self.sparse_hits(text, filter, limit).await,
            SearchStrategy::Hybrid => {
                let (dense, sparse) = tokio::try_join!(
                    self.dense_hits(text, kind, filter.clone(), limit),
                    self.sparse_hits(text, filter, limit),
                )?;
                let alpha = classification.alpha;
                let mut fused = match self.config.fusion {
                    FusionMethod::WeightedSum => weighted_sum_fusion(dense, sparse, alpha),
                    FusionMethod::Rrf => {
                        reciprocal_rank_fusion(dense, sparse, alpha, self.config.rrf_k)
                    }
                };
                fused.truncate(limit);
                Ok(fused)
            }
        }
    }

    async fn dense_hits(
        &self,
        text: &str,
        kind: DocumentKind,
        filter: Option<StoreFilter>,
        limit: usize,
    ) -> RecallResult<Vec<ScoredPoint>> {
        let dense = self.embeddings.embed_dense(kind, text).await?;
        self.store
            .query(&NamedQuery {
                vector_name: dense.field,
                vector: QueryVector::Dense(dense.values),
                filter,
                limit,
            })
            .await
    }

    async fn sparse_hits(
        &self,
        text: &str,
        filter: Option<StoreFilter>,
        limit: usize,
    ) -> RecallResult<Vec<ScoredPoint>> {
        let sparse = self.embeddings.sparse().embed(text).await?;
        self.store
            .query(&NamedQuery {
                vector_name: SPARSE_VECTOR.to_string(),
                vector: QueryVector::Sparse(sparse),
                filter,
                limit,
            })
            .await
    }

    fn store_filter(
        &self,
        query: &SearchQuery,
        temporal: Option<&TemporalFilter>,
    ) -> Option<StoreFilter> {
        let mut filter = StoreFilter::default();
        if let Some(range) =
            temporal.and_then(|t| build_temporal_filter_on(t, &self.config.temporal_field))
        {
            filter.extend(range);
        }
        if let Some(session_id) = &query.filters.session_id {
            filter.must.push(FieldCondition::matches("session_id", session_id.as_str()));
        }
        if let Some(content_type) = &query.filters.content_type {
            filter.must.push(FieldCondition::matches("type", content_type.as_str()));
        }
        filter.into_option()
    }

    fn track(&self, tier: RerankTier, outcome: &RerankOutcome, now: DateTime<Utc>) {
        let mut tracker = lock(&self.degradations);
        if outcome.is_clean() {
            tracker.mark_recovered(&component_name(tier), now);
        } else {
            for event in &outcome.events {
                tracker.record(event.clone());
            }
        }
    }

    fn log_query(
        &self,
        query: &SearchQuery,
        response: &SearchResponse,
        plan: Option<RerankPlan>,
        started: Instant,
    ) {
        lock(&self.query_log).record(QueryLogEntry {
            query_id: response.query_id.clone(),
            query: query.text.clone(),
            strategy: response.classification.strategy,
            alpha: response.classification.alpha,
            latency: started.elapsed(),
            result_count: response.results.len(),
            rerank_tier: plan.map(|p| p.tier),
            degraded: response.degraded,
            timestamp_epoch_ms: self.clock.now_ms(),
        });
    }

    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.clock.now_ms()).unwrap_or_else(Utc::now)
    }
}

/// Explicit caller bounds replace parsed ones; the parsed phrase and
/// recency intent are kept.
fn effective_temporal(
    parsed: Option<TemporalFilter>,
    explicit: Option<&TimeRange>,
) -> Option<TemporalFilter> {
    match explicit {
        Some(range) if range.after.is_some() || range.before.is_some() => {
            let (expression, sort_by_recency) = parsed
                .map(|f| (f.expression, f.sort_by_recency))
                .unwrap_or_default();
            Some(TemporalFilter {
                after: range.after,
                before: range.before,
                expression,
                sort_by_recency,
            })
        }
        _ => parsed,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
