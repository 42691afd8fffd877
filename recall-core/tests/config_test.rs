use std::collections::HashMap;

use recall_core::config::*;
use recall_core::models::{FusionMethod, RerankTier};

#[test]
fn config_loads_from_empty_toml_with_all_defaults() {
    let config = RecallConfig::from_toml("").unwrap();

    // Embedding defaults
    assert!(config.embedding.text_model_dir.is_none());
    assert_eq!(config.embedding.text_dimensions, 384);
    assert_eq!(config.embedding.code_dimensions, 768);
    assert_eq!(config.embedding.multi_vector_dimensions, 128);
    assert_eq!(config.embedding.max_tokens, 512);
    assert_eq!(config.embedding.code_max_tokens, 1024);

    // Cache defaults
    assert_eq!(config.cache.max_size_bytes, 1024 * 1024 * 1024);
    assert_eq!(config.cache.ttl_ms, 3_600_000);

    // Indexer defaults
    assert_eq!(config.indexer.batch_size, 32);
    assert_eq!(config.indexer.flush_interval_ms, 5_000);

    // Retrieval defaults
    assert!(!config.retrieval.rerank_enabled);
    assert_eq!(config.retrieval.rerank_tier, RerankTier::Fast);
    assert_eq!(config.retrieval.rerank_depth, 20);
    assert_eq!(config.retrieval.default_limit, 10);
    assert_eq!(config.retrieval.fusion, FusionMethod::WeightedSum);
    assert_eq!(config.retrieval.rrf_k, 60);

    // Observability defaults
    assert_eq!(config.observability.log_level, "info");
}

#[test]
fn config_loads_partial_toml_with_overrides() {
    let toml = r#"
[cache]
max_size_bytes = 4096
ttl_ms = 1000

[retrieval]
rerank_tier = "colbert"
fusion = "rrf"
"#;
    let config = RecallConfig::from_toml(toml).unwrap();
    assert_eq!(config.cache.max_size_bytes, 4096);
    assert_eq!(config.cache.ttl_ms, 1000);
    assert_eq!(config.retrieval.rerank_tier, RerankTier::Colbert);
    assert_eq!(config.retrieval.fusion, FusionMethod::Rrf);
    // Non-overridden fields keep defaults
    assert_eq!(config.indexer.batch_size, 32);
    assert_eq!(config.retrieval.rerank_depth, 20);
}

#[test]
fn config_reads_reranker_model_dirs_table() {
    let toml = r#"
[embedding.reranker_model_dirs]
fast = "/models/ms-marco-mini"
code = "/models/code-rerank"
"#;
    let config = RecallConfig::from_toml(toml).unwrap();
    assert_eq!(
        config.embedding.reranker_model_dirs.get("fast").map(String::as_str),
        Some("/models/ms-marco-mini")
    );
    assert_eq!(config.embedding.reranker_model_dirs.len(), 2);
}

#[test]
fn config_rejects_malformed_toml() {
    assert!(RecallConfig::from_toml("[cache\nmax_size_bytes = ").is_err());
}

#[test]
fn config_rejects_zero_batch_size() {
    let err = RecallConfig::from_toml("[indexer]\nbatch_size = 0").unwrap_err();
    assert!(err.to_string().contains("indexer.batch_size"));
}

#[test]
fn config_rejects_zero_cache_budget() {
    assert!(RecallConfig::from_toml("[cache]\nmax_size_bytes = 0").is_err());
    assert!(RecallConfig::from_toml("[cache]\nttl_ms = 0").is_err());
}

#[test]
fn config_rejects_negative_boost() {
    assert!(RecallConfig::from_toml("[retrieval]\nrecency_boost_factor = -0.5").is_err());
}

#[test]
fn env_overrides_take_priority() {
    let env: HashMap<&str, &str> = [
        ("RECALL_CACHE_MAX_SIZE_BYTES", "2048"),
        ("RECALL_BATCH_SIZE", "2"),
        ("RECALL_RERANK_TIER", "accurate"),
        ("RECALL_LOG", "debug"),
    ]
    .into_iter()
    .collect();

    let mut config = RecallConfig::from_toml("[indexer]\nbatch_size = 64").unwrap();
    config
        .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
        .unwrap();

    assert_eq!(config.cache.max_size_bytes, 2048);
    assert_eq!(config.indexer.batch_size, 2);
    assert_eq!(config.retrieval.rerank_tier, RerankTier::Accurate);
    assert_eq!(config.observability.log_level, "debug");
    // Untouched keys keep their values
    assert_eq!(config.cache.ttl_ms, 3_600_000);
}

#[test]
fn env_override_with_garbage_is_an_error() {
    let mut config = RecallConfig::default();
    let err = config
        .apply_env_overrides(|k| (k == "RECALL_CACHE_TTL_MS").then(|| "soon".to_string()))
        .unwrap_err();
    assert!(err.to_string().contains("RECALL_CACHE_TTL_MS"));
}

#[test]
fn unknown_rerank_tier_in_env_is_an_error() {
    let mut config = RecallConfig::default();
    assert!(config
        .apply_env_overrides(|k| (k == "RECALL_RERANK_TIER").then(|| "slowest".to_string()))
        .is_err());
}

#[test]
fn load_without_path_uses_defaults() {
    let config = RecallConfig::load(None).unwrap();
    assert_eq!(config.retrieval.default_limit, 10);
}

#[test]
fn load_missing_file_reports_path() {
    let err = RecallConfig::load(Some(std::path::Path::new("/nonexistent/recall.toml"))).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/recall.toml"));
}
