//! Configuration for every subsystem, loaded from TOML with env overrides.

pub mod cache_config;
pub mod defaults;
pub mod embedding_config;
pub mod indexer_config;
pub mod observability_config;
pub mod retrieval_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use cache_config::CacheConfig;
pub use embedding_config::EmbeddingConfig;
pub use indexer_config::IndexerConfig;
pub use observability_config::ObservabilityConfig;
pub use retrieval_config::RetrievalConfig;

use crate::errors::{RecallError, RecallResult};
use crate::models::RerankTier;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`RECALL_*`)
/// 2. TOML file passed to [`RecallConfig::load`]
/// 3. Compiled defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    pub embedding: EmbeddingConfig,
    pub cache: CacheConfig,
    pub indexer: IndexerConfig,
    pub retrieval: RetrievalConfig,
    pub observability: ObservabilityConfig,
}

impl RecallConfig {
    /// Parse configuration from a TOML string. Missing keys keep their defaults.
    pub fn from_toml(toml_str: &str) -> RecallResult<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| RecallError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional TOML file, then apply `RECALL_*` env overrides.
    pub fn load(path: Option<&Path>) -> RecallResult<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    RecallError::ConfigError(format!("{}: {e}", path.display()))
                })?;
                toml::from_str(&content).map_err(|e| {
                    RecallError::ConfigError(format!("{}: {e}", path.display()))
                })?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> RecallResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RECALL_CACHE_MAX_SIZE_BYTES") {
            self.cache.max_size_bytes = parse_env("RECALL_CACHE_MAX_SIZE_BYTES", &v)?;
        }
        if let Some(v) = lookup("RECALL_CACHE_TTL_MS") {
            self.cache.ttl_ms = parse_env("RECALL_CACHE_TTL_MS", &v)?;
        }
        if let Some(v) = lookup("RECALL_BATCH_SIZE") {
            self.indexer.batch_size = parse_env("RECALL_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("RECALL_FLUSH_INTERVAL_MS") {
            self.indexer.flush_interval_ms = parse_env("RECALL_FLUSH_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("RECALL_RERANK_TIER") {
            self.retrieval.rerank_tier = v.parse::<RerankTier>()?;
        }
        if let Some(v) = lookup("RECALL_RERANK_DEPTH") {
            self.retrieval.rerank_depth = parse_env("RECALL_RERANK_DEPTH", &v)?;
        }
        if let Some(v) = lookup("RECALL_LOG") {
            self.observability.log_level = v;
        }
        Ok(())
    }

    /// Reject values that would make a subsystem misbehave.
    pub fn validate(&self) -> RecallResult<()> {
        if self.cache.max_size_bytes == 0 {
            return Err(invalid("cache.max_size_bytes", "must be greater than 0"));
        }
        if self.cache.ttl_ms == 0 {
            return Err(invalid("cache.ttl_ms", "must be greater than 0"));
        }
        if self.indexer.batch_size == 0 {
            return Err(invalid("indexer.batch_size", "must be greater than 0"));
        }
        if self.indexer.flush_interval_ms == 0 {
            return Err(invalid("indexer.flush_interval_ms", "must be greater than 0"));
        }
        if self.retrieval.default_limit == 0 {
            return Err(invalid("retrieval.default_limit", "must be greater than 0"));
        }
        if !self.retrieval.recency_boost_factor.is_finite()
            || self.retrieval.recency_boost_factor < 0.0
        {
            return Err(invalid(
                "retrieval.recency_boost_factor",
                "must be a finite, non-negative number",
            ));
        }
        if self.embedding.text_dimensions == 0
            || self.embedding.code_dimensions == 0
            || self.embedding.multi_vector_dimensions == 0
        {
            return Err(invalid("embedding", "dimensions must be greater than 0"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> RecallResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| RecallError::ConfigError(format!("{key}: cannot parse {value:?}")))
}

fn invalid(field: &str, message: &str) -> RecallError {
    RecallError::ConfigError(format!("{field}: {message}"))
}
