//! SearchIndexer: sparse, multi-vector, and dense vectors for one node, then one upsert.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use recall_core::errors::RecallResult;
use recall_core::models::{
    DocumentKind, EmbeddingVectorSet, IndexableNode, MultiVector, PointPayload, VectorPoint,
};
use recall_core::traits::VectorStore;
use recall_embeddings::{EmbeddingCache, EmbeddingEngine};
use tokio::sync::Mutex;
use tracing::{debug, info, Instrument};

use crate::{IndexOutcome, NodeIndexer};

/// Writes documents to the vector store and keeps the multi-vector cache in step.
///
/// Calls for the same id are serialized, so the cache always holds the
/// vectors of the write that persisted last. A failed write leaves the id
/// uncached. Cache entries carry the content hash they were encoded from,
/// which lets an unchanged document skip the multi-vector encode.
pub struct SearchIndexer {
    embeddings: Arc<EmbeddingEngine>,
    cache: Arc<EmbeddingCache>,
    store: Arc<dyn VectorStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SearchIndexer {
    pub fn new(
        embeddings: Arc<EmbeddingEngine>,
        cache: Arc<EmbeddingCache>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            embeddings,
            cache,
            store,
            locks: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    /// Index one node. Blank content is skipped without touching the store.
    pub async fn index_node(&self, node: &IndexableNode) -> RecallResult<IndexOutcome> {
        let kind = node.kind();
        let content = node.content_for(kind);
        if content.trim().is_empty() {
            debug!(node_id = %node.id, ?kind, "empty content, skipping");
            return Ok(IndexOutcome::SkippedEmpty);
        }

        let span = recall_observability::indexing_span!(node.id, kind);
        async {
            let lock = self.lock_for(&node.id);
            let result = {
                let _guard = lock.lock().await;
                let result = self.write(node, kind, content).await;
                if result.is_err() {
                    self.cache.invalidate(&node.id);
                }
                result
            };
            drop(lock);
            self.locks.remove_if(&node.id, |_, l| Arc::strong_count(l) == 1);
            result
        }
        .instrument(span)
        .await
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(id.to_string()).or_default().value())
    }

    async fn write(
        &self,
        node: &IndexableNode,
        kind: DocumentKind,
        content: &str,
    ) -> RecallResult<IndexOutcome> {
        let hash = blake3::hash(content.as_bytes());

        let sparse = self.embeddings.sparse().embed(content).await?;
        let multi_vector = self.document_tokens(&node.id, content, &hash).await?;
        let dense = self.embeddings.embed_dense(kind, content).await?;

        let point = VectorPoint {
            id: node.id.clone(),
            vectors: EmbeddingVectorSet {
                dense,
                sparse,
                multi_vector: multi_vector.clone(),
            },
            payload: PointPayload {
                content: content.to_string(),
                node_id: node.id.clone(),
                session_id: node.session_id.clone(),
                kind: kind.payload_type().to_string(),
                timestamp: node.timestamp,
                file_path: node.file_path.clone(),
            },
        };
        self.store.upsert(point).await?;

        let tokens = multi_vector.len();
        self.cache.set_with_hash(&node.id, multi_vector, hash);

        info!(node_id = %node.id, ?kind, tokens, "node indexed");
        Ok(IndexOutcome::Indexed)
    }

    /// Cached document tokens when the content is unchanged, fresh ones otherwise.
    async fn document_tokens(
        &self,
        id: &str,
        content: &str,
        hash: &blake3::Hash,
    ) -> RecallResult<MultiVector> {
        if let Some(cached) = self.cache.get_if_hash(id, hash) {
            debug!(node_id = id, "reusing cached multi-vector");
            return Ok(cached);
        }
        self.cache.invalidate(id);
        self.embeddings.multi_vector().encode_document(content).await
    }
}

#[async_trait]
impl NodeIndexer for SearchIndexer {
    async fn index_node(&self, node: &IndexableNode) -> RecallResult<IndexOutcome> {
        SearchIndexer::index_node(self, node).await
    }
}
