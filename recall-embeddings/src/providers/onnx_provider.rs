//! ONNX Runtime inference backend.
//!
//! A model directory holds `model.onnx` and a HuggingFace `tokenizer.json`.
//! Inference runs on the blocking pool; the session is behind a mutex
//! because `run` needs `&mut Session`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use recall_core::errors::{EmbeddingError, RecallResult};
use recall_core::models::{ModelOutput, TokenizedInput};
use recall_core::traits::{BackendLoader, InferenceBackend};
use tokenizers::Tokenizer;
use tracing::debug;

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct OnnxBackend {
    session: Arc<Mutex<Session>>,
    tokenizer: Tokenizer,
    name: String,
}

impl OnnxBackend {
    /// Load session and tokenizer from `dir`. Blocking.
    pub fn load(name: &str, dir: &Path, intra_threads: usize) -> RecallResult<Self> {
        let load_err = |reason: String| EmbeddingError::BackendLoadFailed {
            model: name.to_string(),
            reason,
        };

        let model_path = dir.join(MODEL_FILE);
        let tokenizer_path = dir.join(TOKENIZER_FILE);
        for path in [&model_path, &tokenizer_path] {
            if !path.exists() {
                return Err(load_err(format!("{} not found", path.display())).into());
            }
        }

        let session = Session::builder()
            .map_err(|e| load_err(e.to_string()))?
            .with_intra_threads(intra_threads)
            .map_err(|e| load_err(e.to_string()))?
            .commit_from_file(&model_path)
            .map_err(|e| load_err(e.to_string()))?;

        let tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| load_err(e.to_string()))?;

        debug!(model = name, dir = %dir.display(), "ONNX session created");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer,
            name: name.to_string(),
        })
    }

    fn encoded(encoding: tokenizers::Encoding, max_tokens: usize) -> TokenizedInput {
        let mut input = TokenizedInput::new(
            encoding.get_ids().to_vec(),
            encoding.get_attention_mask().to_vec(),
        );
        input.truncate(max_tokens);
        input
    }
}

/// Forward pass over a single sequence. Returns the first output tensor.
fn infer(session: &Mutex<Session>, input: &TokenizedInput) -> RecallResult<ModelOutput> {
    let seq_len = input.len();
    let ids: Vec<i64> = input.ids.iter().map(|&id| id as i64).collect();
    let mask: Vec<i64> = input.attention_mask.iter().map(|&m| m as i64).collect();

    let ids_tensor = Tensor::from_array((vec![1i64, seq_len as i64], ids)).map_err(|e| {
        EmbeddingError::InferenceFailed {
            reason: format!("tensor creation error: {e}"),
        }
    })?;
    let mask_tensor = Tensor::from_array((vec![1i64, seq_len as i64], mask)).map_err(|e| {
        EmbeddingError::InferenceFailed {
            reason: format!("tensor creation error: {e}"),
        }
    })?;

    let mut session = session.lock().map_err(|e| EmbeddingError::InferenceFailed {
        reason: format!("session lock poisoned: {e}"),
    })?;

    let outputs = session
        .run(ort::inputs![ids_tensor, mask_tensor])
        .map_err(|e| EmbeddingError::InferenceFailed {
            reason: e.to_string(),
        })?;

    let (_name, output) = outputs
        .iter()
        .next()
        .ok_or_else(|| EmbeddingError::InferenceFailed {
            reason: "no output tensor".to_string(),
        })?;

    let (shape, data) =
        output
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("tensor extraction failed: {e}"),
            })?;

    Ok(ModelOutput::new(
        shape.iter().map(|&d| d.max(0) as usize).collect(),
        data.to_vec(),
    ))
}

#[async_trait]
impl InferenceBackend for OnnxBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn tokenize(&self, text: &str, max_tokens: usize) -> RecallResult<TokenizedInput> {
        let encoding =
            self.tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;
        Ok(Self::encoded(encoding, max_tokens))
    }

    fn tokenize_pair(
        &self,
        first: &str,
        second: &str,
        max_tokens: usize,
    ) -> RecallResult<TokenizedInput> {
        let encoding = self
            .tokenizer
            .encode((first, second), true)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: e.to_string(),
            })?;
        Ok(Self::encoded(encoding, max_tokens))
    }

    async fn run(&self, input: &TokenizedInput) -> RecallResult<ModelOutput> {
        let session = Arc::clone(&self.session);
        let input = input.clone();
        tokio::task::spawn_blocking(move || infer(&session, &input))
            .await
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("inference task failed: {e}"),
            })?
    }
}

/// Loads an [`OnnxBackend`] from a model directory on the blocking pool.
#[derive(Debug, Clone)]
pub struct OnnxLoader {
    model_id: String,
    dir: PathBuf,
    intra_threads: usize,
}

impl OnnxLoader {
    pub fn new(model_id: impl Into<String>, dir: impl Into<PathBuf>, intra_threads: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dir: dir.into(),
            intra_threads,
        }
    }
}

#[async_trait]
impl BackendLoader for OnnxLoader {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn load(&self) -> RecallResult<Arc<dyn InferenceBackend>> {
        let (id, dir, threads) = (self.model_id.clone(), self.dir.clone(), self.intra_threads);
        let backend = tokio::task::spawn_blocking(move || OnnxBackend::load(&id, &dir, threads))
            .await
            .map_err(|e| EmbeddingError::BackendLoadFailed {
                model: self.model_id.clone(),
                reason: format!("load task failed: {e}"),
            })??;
        Ok(Arc::new(backend))
    }
}
