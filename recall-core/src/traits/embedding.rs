use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::RecallResult;
use crate::models::{ModelOutput, TokenizedInput};

/// A loaded model: tokenizer plus forward pass.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Tokenize a single sequence, truncated to `max_tokens`.
    fn tokenize(&self, text: &str, max_tokens: usize) -> RecallResult<TokenizedInput>;

    /// Tokenize a `(query, document)` pair as one sequence, truncated to `max_tokens`.
    fn tokenize_pair(
        &self,
        first: &str,
        second: &str,
        max_tokens: usize,
    ) -> RecallResult<TokenizedInput>;

    /// Run the forward pass. Output is row-major with a leading batch dimension of 1.
    async fn run(&self, input: &TokenizedInput) -> RecallResult<ModelOutput>;
}

/// Produces a backend on first use. Called at most once per model handle.
#[async_trait]
pub trait BackendLoader: Send + Sync {
    /// Identifier of the model being loaded, used in errors and logs.
    fn model_id(&self) -> &str;

    async fn load(&self) -> RecallResult<Arc<dyn InferenceBackend>>;
}
