//! Rerank tiers: a second, deeper scoring pass over the top candidates.
//!
//! A failing candidate keeps its pre-rerank score and is marked degraded.
//! A failing (or missing) tier degrades every candidate it was asked to score.

pub mod colbert;
pub mod cross_encoder;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recall_core::config::EmbeddingConfig;
use recall_core::errors::RecallResult;
use recall_core::models::{DegradationEvent, RerankTier, SearchResult};
use recall_embeddings::{create_loader, EmbeddingCache, EmbeddingEngine, ModelHandle};
use tracing::{debug, warn};

pub use colbert::ColbertReranker;
pub use cross_encoder::CrossEncoderReranker;

/// Outcome of scoring one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateScore {
    Scored(f64),
    Failed(String),
}

/// A rerank tier. Returns one [`CandidateScore`] per candidate, in order.
///
/// `Err` means the whole tier failed.
#[async_trait]
pub trait Reranker: Send + Sync {
    fn tier(&self) -> RerankTier;

    async fn score(&self, query: &str, candidates: &[SearchResult])
        -> RecallResult<Vec<CandidateScore>>;
}

/// Rerankers by tier.
#[derive(Default, Clone)]
pub struct RerankerRegistry {
    rerankers: HashMap<RerankTier, Arc<dyn Reranker>>,
}

impl fmt::Debug for RerankerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RerankerRegistry")
            .field("tiers", &self.tiers())
            .finish()
    }
}

impl RerankerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// ColBERT over the shared engine and cache, plus a cross-encoder for
    /// every tier with a configured model directory.
    pub fn from_config(
        config: &EmbeddingConfig,
        embeddings: Arc<EmbeddingEngine>,
        cache: Arc<EmbeddingCache>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ColbertReranker::new(embeddings, cache)));

        for tier in [RerankTier::Fast, RerankTier::Accurate, RerankTier::Code] {
            if let Some(dir) = config.reranker_model_dirs.get(tier.as_str()) {
                let loader = create_loader(tier.as_str(), Some(dir), config.intra_threads);
                registry.register(Arc::new(CrossEncoderReranker::new(
                    tier,
                    Arc::new(ModelHandle::new(loader)),
                    config.max_tokens,
                )));
            }
        }
        registry
    }

    /// Register `reranker` under its tier, replacing any previous one.
    pub fn register(&mut self, reranker: Arc<dyn Reranker>) {
        self.rerankers.insert(reranker.tier(), reranker);
    }

    pub fn get(&self, tier: RerankTier) -> Option<&Arc<dyn Reranker>> {
        self.rerankers.get(&tier)
    }

    pub fn tiers(&self) -> Vec<RerankTier> {
        let mut tiers: Vec<_> = self.rerankers.keys().copied().collect();
        tiers.sort_by_key(|t| t.as_str());
        tiers
    }
}

/// Result of one rerank pass.
#[derive(Debug)]
pub struct RerankOutcome {
    pub results: Vec<SearchResult>,
    pub events: Vec<DegradationEvent>,
}

impl RerankOutcome {
    /// Whether every candidate was rescored.
    pub fn is_clean(&self) -> bool {
        self.events.is_empty()
    }
}

/// Component name used in degradation events for `tier`.
pub fn component_name(tier: RerankTier) -> String {
    format!("rerank.{tier}")
}

/// Rescore the first `depth` results with `tier`, re-sort them, keep the tail as is.
pub async fn rerank_top(
    registry: &RerankerRegistry,
    tier: RerankTier,
    query: &str,
    mut results: Vec<SearchResult>,
    depth: usize,
    now: DateTime<Utc>,
) -> RerankOutcome {
    let depth = depth.min(results.len());
    if depth == 0 {
        return RerankOutcome {
            results,
            events: Vec::new(),
        };
    }
    let tail = results.split_off(depth);
    let mut head = results;

    let scores = match registry.get(tier) {
        Some(reranker) => reranker.score(query, &head).await.and_then(|scores| {
            if scores.len() == head.len() {
                Ok(scores)
            } else {
                Err(recall_core::errors::RetrievalError::RerankFailed {
                    tier: tier.to_string(),
                    reason: format!("{} scores for {} candidates", scores.len(), head.len()),
                }
                .into())
            }
        }),
        None => Err(recall_core::errors::RetrievalError::RerankerUnavailable {
            tier: tier.to_string(),
        }
        .into()),
    };

    let component = component_name(tier);
    let mut events = Vec::new();
    match scores {
        Ok(scores) => {
            for (result, score) in head.iter_mut().zip(scores) {
                match score {
                    CandidateScore::Scored(s) => result.score = s,
                    CandidateScore::Failed(reason) => {
                        debug!(id = %result.id, %tier, %reason, "candidate rerank failed");
                        result.degraded = true;
                        events.push(degradation(&component, &result.id, &reason, now));
                    }
                }
            }
        }
        Err(e) => {
            warn!(%tier, error = %e, candidates = head.len(), "rerank tier failed");
            let reason = e.to_string();
            for result in &mut head {
                result.degraded = true;
            }
            events.push(degradation(&component, "*", &reason, now));
        }
    }

    head.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    head.extend(tail);
    RerankOutcome {
        results: head,
        events,
    }
}

fn degradation(component: &str, target: &str, reason: &str, now: DateTime<Utc>) -> DegradationEvent {
    DegradationEvent {
        component: component.to_string(),
        failure: format!("{target}: {reason}"),
        fallback_used: "pre-rerank score".to_string(),
        timestamp: now,
    }
}

/// Logistic squash of a raw logit into `(0, 1)`.
pub fn sigmoid(x: f32) -> f64 {
    1.0 / (1.0 + (-f64::from(x)).exp())
}
