//! Backend loaders.
//!
//! Each configured model directory becomes an [`OnnxLoader`]. A model with no
//! directory gets a loader that always fails, so the first use of that model
//! reports the missing configuration instead of silently degrading.

pub mod onnx_provider;

pub use onnx_provider::{OnnxBackend, OnnxLoader};

use std::sync::Arc;

use async_trait::async_trait;
use recall_core::errors::{EmbeddingError, RecallResult};
use recall_core::traits::{BackendLoader, InferenceBackend};
use tracing::{info, warn};

/// Loader for `model_id` from an optional model directory.
pub fn create_loader(
    model_id: &str,
    dir: Option<&str>,
    intra_threads: usize,
) -> Arc<dyn BackendLoader> {
    match dir {
        Some(dir) => {
            info!(model = model_id, dir, "ONNX backend configured");
            Arc::new(OnnxLoader::new(model_id, dir, intra_threads))
        }
        None => {
            warn!(model = model_id, "no model directory configured");
            Arc::new(UnconfiguredLoader {
                model_id: model_id.to_string(),
            })
        }
    }
}

struct UnconfiguredLoader {
    model_id: String,
}

#[async_trait]
impl BackendLoader for UnconfiguredLoader {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn load(&self) -> RecallResult<Arc<dyn InferenceBackend>> {
        Err(EmbeddingError::BackendLoadFailed {
            model: self.model_id.clone(),
            reason: "no model directory configured".to_string(),
        }
        .into())
    }
}
