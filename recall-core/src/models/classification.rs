use serde::{Deserialize, Serialize};

/// How the vector store is searched for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Dense vectors only (semantic).
    Dense,
    /// Sparse vectors only (lexical).
    Sparse,
    /// Both, fused with `alpha`.
    Hybrid,
}

/// Strategy plus fusion weight for one query.
///
/// `alpha` is the weight of the dense score; `1 - alpha` goes to sparse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub strategy: SearchStrategy,
    pub alpha: f64,
}

impl ClassificationResult {
    pub fn new(strategy: SearchStrategy, alpha: f64) -> Self {
        Self {
            strategy,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// Result for an explicit strategy override.
    pub fn from_override(strategy: SearchStrategy) -> Self {
        let alpha = match strategy {
            SearchStrategy::Dense => 1.0,
            SearchStrategy::Sparse => 0.0,
            SearchStrategy::Hybrid => 0.5,
        };
        Self::new(strategy, alpha)
    }
}
