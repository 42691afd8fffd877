//! EmbeddingEngine: the four embedders behind one entry point.

use std::sync::Arc;

use recall_core::config::EmbeddingConfig;
use recall_core::errors::RecallResult;
use recall_core::models::{DenseVector, DocumentKind};
use recall_core::traits::BackendLoader;
use tracing::info;

use crate::dense::DenseEmbedder;
use crate::handle::ModelHandle;
use crate::multi_vector::MultiVectorEmbedder;
use crate::providers;
use crate::sparse::SparseEmbedder;

/// One loader per model.
pub struct EngineLoaders {
    pub text: Arc<dyn BackendLoader>,
    pub code: Arc<dyn BackendLoader>,
    pub sparse: Arc<dyn BackendLoader>,
    pub multi_vector: Arc<dyn BackendLoader>,
}

impl EngineLoaders {
    /// ONNX loaders for the directories named in `config`.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let threads = config.intra_threads;
        Self {
            text: providers::create_loader("text", config.text_model_dir.as_deref(), threads),
            code: providers::create_loader("code", config.code_model_dir.as_deref(), threads),
            sparse: providers::create_loader("splade", config.sparse_model_dir.as_deref(), threads),
            multi_vector: providers::create_loader(
                "colbert",
                config.multi_vector_model_dir.as_deref(),
                threads,
            ),
        }
    }
}

pub struct EmbeddingEngine {
    text: DenseEmbedder,
    code: DenseEmbedder,
    sparse: SparseEmbedder,
    multi_vector: MultiVectorEmbedder,
}

impl EmbeddingEngine {
    /// Engine backed by ONNX models from `config`. Nothing loads until first use.
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self::with_loaders(config, EngineLoaders::from_config(config))
    }

    pub fn with_loaders(config: &EmbeddingConfig, loaders: EngineLoaders) -> Self {
        let handle = |loader| Arc::new(ModelHandle::new(loader));

        let engine = Self {
            text: DenseEmbedder::new(
                handle(loaders.text),
                DocumentKind::Text,
                config.text_dimensions,
                config.max_tokens,
            ),
            code: DenseEmbedder::new(
                handle(loaders.code),
                DocumentKind::Code,
                config.code_dimensions,
                config.code_max_tokens,
            ),
            sparse: SparseEmbedder::new(handle(loaders.sparse), config.max_tokens),
            multi_vector: MultiVectorEmbedder::new(
                handle(loaders.multi_vector),
                config.multi_vector_dimensions,
                config.max_tokens,
            ),
        };

        info!(
            text_dims = config.text_dimensions,
            code_dims = config.code_dimensions,
            multi_vector_dims = config.multi_vector_dimensions,
            "EmbeddingEngine initialized"
        );
        engine
    }

    pub fn dense(&self, kind: DocumentKind) -> &DenseEmbedder {
        match kind {
            DocumentKind::Text => &self.text,
            DocumentKind::Code => &self.code,
        }
    }

    pub fn sparse(&self) -> &SparseEmbedder {
        &self.sparse
    }

    pub fn multi_vector(&self) -> &MultiVectorEmbedder {
        &self.multi_vector
    }

    /// Dense embedding tagged with the named vector for `kind`.
    pub async fn embed_dense(&self, kind: DocumentKind, text: &str) -> RecallResult<DenseVector> {
        self.dense(kind).embed_tagged(text).await
    }

    /// Load every model now. Stops at the first failure.
    pub async fn preload_all(&self) -> RecallResult<()> {
        for handle in self.handles() {
            handle.preload().await?;
        }
        Ok(())
    }

    /// Whether every model is resident.
    pub fn is_ready(&self) -> bool {
        self.handles().iter().all(|h| h.is_ready())
    }

    fn handles(&self) -> [&Arc<ModelHandle>; 4] {
        [
            self.text.handle(),
            self.code.handle(),
            self.sparse.handle(),
            self.multi_vector.handle(),
        ]
    }
}
