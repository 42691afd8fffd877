use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{CODE_LABELS, DENSE_CODE_VECTOR, DENSE_TEXT_VECTOR};

/// What kind of document a node becomes. Decided once, at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Code,
    Text,
}

impl DocumentKind {
    /// Code if any label is code-bearing, text ("thought") otherwise.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        if labels
            .iter()
            .any(|l| CODE_LABELS.contains(&l.as_ref()))
        {
            Self::Code
        } else {
            Self::Text
        }
    }

    /// Named dense vector field for this kind.
    pub fn dense_vector_name(self) -> &'static str {
        match self {
            Self::Code => DENSE_CODE_VECTOR,
            Self::Text => DENSE_TEXT_VECTOR,
        }
    }

    /// Value stored in the point payload's `type` field.
    pub fn payload_type(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Text => "thought",
        }
    }
}

/// A unit of content handed to the indexer by the upstream pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexableNode {
    pub id: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub content: String,
    /// Diff body for code changes.
    #[serde(default)]
    pub patch_content: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl IndexableNode {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            labels: Vec::new(),
            content: content.into(),
            patch_content: None,
            session_id: None,
            file_path: None,
            timestamp: None,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_labels(&self.labels)
    }

    /// The text to embed for `kind`. Code prefers the patch body.
    pub fn content_for(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::Code => self
                .patch_content
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(&self.content),
            DocumentKind::Text => &self.content,
        }
    }
}
