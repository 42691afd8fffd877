use chrono::{DateTime, Utc};
use recall_core::models::IndexableNode;

/// A plain-text ("thought") node.
pub fn text_node(id: &str, content: &str) -> IndexableNode {
    IndexableNode::new(id, content)
}

/// A code-diff node whose patch differs from its summary content.
pub fn code_node(id: &str, summary: &str, patch: &str) -> IndexableNode {
    let mut node = IndexableNode::new(id, summary);
    node.labels = vec!["CodeDiff".to_string()];
    node.patch_content = Some(patch.to_string());
    node
}

pub fn node_at(id: &str, content: &str, timestamp: DateTime<Utc>) -> IndexableNode {
    let mut node = IndexableNode::new(id, content);
    node.timestamp = Some(timestamp);
    node
}

pub fn session_node(id: &str, content: &str, session_id: &str) -> IndexableNode {
    let mut node = IndexableNode::new(id, content);
    node.session_id = Some(session_id.to_string());
    node
}
