/// Indexing pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexingError {
    #[error("batch indexer is shut down; rejected node {node_id}")]
    ShutDown { node_id: String },

    #[error("indexing node {node_id} failed: {reason}")]
    NodeFailed { node_id: String, reason: String },
}
