use serde::{Deserialize, Serialize};

use super::defaults;

/// Embedding subsystem configuration.
///
/// Each model directory holds `model.onnx` and `tokenizer.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Dense text model directory.
    pub text_model_dir: Option<String>,
    /// Dense code model directory.
    pub code_model_dir: Option<String>,
    /// SPLADE model directory.
    pub sparse_model_dir: Option<String>,
    /// ColBERT model directory.
    pub multi_vector_model_dir: Option<String>,
    /// Cross-encoder directories keyed by rerank tier name ("fast", "accurate", "code").
    pub reranker_model_dirs: std::collections::HashMap<String, String>,
    /// Dense text dimensions.
    pub text_dimensions: usize,
    /// Dense code dimensions.
    pub code_dimensions: usize,
    /// Per-token ColBERT dimensions.
    pub multi_vector_dimensions: usize,
    /// Token budget for text, sparse, and multi-vector inputs.
    pub max_tokens: usize,
    /// Token budget for code inputs. Longer code is truncated.
    pub code_max_tokens: usize,
    /// ONNX Runtime intra-op threads per session.
    pub intra_threads: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            text_model_dir: None,
            code_model_dir: None,
            sparse_model_dir: None,
            multi_vector_model_dir: None,
            reranker_model_dirs: std::collections::HashMap::new(),
            text_dimensions: defaults::DEFAULT_TEXT_DIMENSIONS,
            code_dimensions: defaults::DEFAULT_CODE_DIMENSIONS,
            multi_vector_dimensions: defaults::DEFAULT_MULTI_VECTOR_DIMENSIONS,
            max_tokens: defaults::DEFAULT_MAX_TOKENS,
            code_max_tokens: defaults::DEFAULT_CODE_MAX_TOKENS,
            intra_threads: defaults::DEFAULT_INTRA_THREADS,
        }
    }
}
