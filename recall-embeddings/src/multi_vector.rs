//! ColBERT multi-vector embeddings.
//!
//! The raw text gets a role marker (`[D] ` or `[Q] `), the backbone runs
//! without pooling, and each token vector is L2-normalized on its own.

use std::sync::Arc;

use recall_core::constants::{DOCUMENT_MARKER, QUERY_MARKER};
use recall_core::errors::{EmbeddingError, RecallResult};
use recall_core::models::{ModelOutput, MultiVector};
use tracing::debug;

use crate::handle::ModelHandle;
use crate::similarity::l2_normalize;

/// Which side of a late-interaction comparison a text is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Document,
    Query,
}

impl Role {
    pub fn marker(self) -> &'static str {
        match self {
            Self::Document => DOCUMENT_MARKER,
            Self::Query => QUERY_MARKER,
        }
    }

    /// `"[D] text"` / `"[Q] text"`.
    pub fn prefix(self, text: &str) -> String {
        format!("{} {}", self.marker(), text)
    }
}

pub struct MultiVectorEmbedder {
    handle: Arc<ModelHandle>,
    dimensions: usize,
    max_tokens: usize,
}

impl MultiVectorEmbedder {
    pub fn new(handle: Arc<ModelHandle>, dimensions: usize, max_tokens: usize) -> Self {
        Self {
            handle,
            dimensions,
            max_tokens,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn handle(&self) -> &Arc<ModelHandle> {
        &self.handle
    }

    pub async fn encode_document(&self, text: &str) -> RecallResult<MultiVector> {
        self.encode(Role::Document, text).await
    }

    pub async fn encode_query(&self, text: &str) -> RecallResult<MultiVector> {
        self.encode(Role::Query, text).await
    }

    /// One unit vector per token of the (possibly truncated) marked input.
    pub async fn encode(&self, role: Role, text: &str) -> RecallResult<MultiVector> {
        let backend = self.handle.get().await?;
        let input = backend.tokenize(&role.prefix(text), self.max_tokens)?;
        let output = backend.run(&input).await?;
        let vectors = split_token_vectors(&output, self.dimensions)?;

        debug!(
            model = self.handle.model_id(),
            role = ?role,
            tokens = vectors.len(),
            "multi-vector embedding computed"
        );
        Ok(vectors)
    }
}

/// Split `[1, tokens, dim]` (or `[tokens, dim]`) output into normalized token vectors.
pub fn split_token_vectors(output: &ModelOutput, dimensions: usize) -> RecallResult<MultiVector> {
    let (tokens, dims) = match output.shape.as_slice() {
        [1, tokens, dims] | [tokens, dims] => (*tokens, *dims),
        _ => {
            return Err(EmbeddingError::UnexpectedShape {
                shape: output.shape.clone(),
            }
            .into())
        }
    };
    if dims != dimensions {
        return Err(EmbeddingError::DimensionMismatch {
            expected: dimensions,
            actual: dims,
        }
        .into());
    }
    if output.data.len() != tokens * dims {
        return Err(EmbeddingError::UnexpectedShape {
            shape: output.shape.clone(),
        }
        .into());
    }

    Ok(output
        .data
        .chunks_exact(dims)
        .map(|row| {
            let mut v = row.to_vec();
            l2_normalize(&mut v);
            v
        })
        .collect())
}
