use serde::{Deserialize, Serialize};

/// Token ids and attention mask for a single sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizedInput {
    pub ids: Vec<u32>,
    /// 1 for attended positions, 0 for padding.
    pub attention_mask: Vec<u32>,
}

impl TokenizedInput {
    pub fn new(ids: Vec<u32>, attention_mask: Vec<u32>) -> Self {
        Self {
            ids,
            attention_mask,
        }
    }

    /// Cut both ids and mask to at most `max_tokens` positions.
    pub fn truncate(&mut self, max_tokens: usize) {
        self.ids.truncate(max_tokens);
        self.attention_mask.truncate(max_tokens);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Raw model output as a row-major tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl ModelOutput {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    /// Number of elements the shape describes.
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }
}
