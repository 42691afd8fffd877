//! Lazily loaded, shared model handle.
//!
//! The first caller triggers the load; concurrent callers wait on the same
//! in-flight load. The outcome is kept for the lifetime of the handle, so a
//! failed load fails every later call with the same error.

use std::sync::Arc;

use recall_core::errors::{EmbeddingError, RecallError, RecallResult};
use recall_core::traits::{BackendLoader, InferenceBackend};
use tokio::sync::OnceCell;
use tracing::{info, warn};

type LoadOutcome = Result<Arc<dyn InferenceBackend>, EmbeddingError>;

pub struct ModelHandle {
    loader: Arc<dyn BackendLoader>,
    backend: OnceCell<LoadOutcome>,
}

impl ModelHandle {
    pub fn new(loader: Arc<dyn BackendLoader>) -> Self {
        Self {
            loader,
            backend: OnceCell::new(),
        }
    }

    pub fn model_id(&self) -> &str {
        self.loader.model_id()
    }

    /// The loaded backend, loading it on first use.
    pub async fn get(&self) -> RecallResult<Arc<dyn InferenceBackend>> {
        let outcome = self
            .backend
            .get_or_init(|| async {
                let model = self.loader.model_id().to_string();
                info!(model = %model, "loading model");
                match self.loader.load().await {
                    Ok(backend) => {
                        info!(model = %model, backend = backend.name(), "model loaded");
                        Ok(backend)
                    }
                    Err(e) => {
                        let err = into_load_error(&model, e);
                        warn!(model = %model, error = %err, "model load failed");
                        Err(err)
                    }
                }
            })
            .await;
        outcome.clone().map_err(RecallError::from)
    }

    /// Force the load now instead of on first use.
    pub async fn preload(&self) -> RecallResult<()> {
        self.get().await.map(|_| ())
    }

    /// Whether a backend is resident.
    pub fn is_ready(&self) -> bool {
        matches!(self.backend.get(), Some(Ok(_)))
    }

    /// Whether a load was attempted and failed.
    pub fn has_failed(&self) -> bool {
        matches!(self.backend.get(), Some(Err(_)))
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model", &self.model_id())
            .field("ready", &self.is_ready())
            .finish()
    }
}

fn into_load_error(model: &str, err: RecallError) -> EmbeddingError {
    match err {
        RecallError::EmbeddingError(e @ EmbeddingError::BackendLoadFailed { .. }) => e,
        other => EmbeddingError::BackendLoadFailed {
            model: model.to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::fakes::{FailingLoader, HashingLoader};

    #[tokio::test]
    async fn loads_once_for_concurrent_callers() {
        let loader = Arc::new(HashingLoader::new("dense", 8));
        let handle = Arc::new(ModelHandle::new(loader.clone()));
        assert!(!handle.is_ready());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let h = handle.clone();
                tokio::spawn(async move { h.get().await.map(|_| ()) })
            })
            .collect();
        for t in tasks {
            t.await.unwrap().unwrap();
        }

        assert!(handle.is_ready());
        assert_eq!(loader.load_count(), 1);
    }

    #[tokio::test]
    async fn load_failure_is_memoized() {
        let loader = Arc::new(FailingLoader::new("splade", "weights missing"));
        let handle = ModelHandle::new(loader.clone());

        let first = handle.get().await.err().unwrap().to_string();
        let second = handle.preload().await.err().unwrap().to_string();

        assert_eq!(first, second);
        assert!(first.contains("weights missing"));
        assert!(handle.has_failed());
        assert!(!handle.is_ready());
        assert_eq!(loader.load_count(), 1);
    }
}
