use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::RecallError;

/// Which secondary scoring pass runs over the top candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankTier {
    #[default]
    Fast,
    Accurate,
    Code,
    Colbert,
    Llm,
}

impl RerankTier {
    pub const ALL: [RerankTier; 5] = [
        RerankTier::Fast,
        RerankTier::Accurate,
        RerankTier::Code,
        RerankTier::Colbert,
        RerankTier::Llm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Accurate => "accurate",
            Self::Code => "code",
            Self::Colbert => "colbert",
            Self::Llm => "llm",
        }
    }
}

impl fmt::Display for RerankTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RerankTier {
    type Err = RecallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RecallError::ConfigError(format!("unknown rerank tier: {s}")))
    }
}

/// How dense and sparse result lists are merged for hybrid search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    /// `alpha * norm(dense) + (1 - alpha) * norm(sparse)` with min-max normalization.
    #[default]
    WeightedSum,
    /// Reciprocal rank fusion, each list weighted by its alpha share.
    Rrf,
}
