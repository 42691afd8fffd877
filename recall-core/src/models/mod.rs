mod classification;
mod degradation_event;
mod inference;
mod node;
mod point;
mod rerank;
mod search_query;
mod search_result;
mod store_filter;
mod temporal_filter;
mod vectors;

pub use classification::{ClassificationResult, SearchStrategy};
pub use degradation_event::DegradationEvent;
pub use inference::{ModelOutput, TokenizedInput};
pub use node::{DocumentKind, IndexableNode};
pub use point::{NamedQuery, PointPayload, QueryVector, ScoredPoint, VectorPoint};
pub use rerank::{FusionMethod, RerankTier};
pub use search_query::{SearchFilters, SearchQuery, TimeRange};
pub use search_result::{SearchResponse, SearchResult};
pub use store_filter::{FieldCondition, MatchValue, RangeCondition, StoreFilter};
pub use temporal_filter::{TemporalFilter, TemporalParse};
pub use vectors::{DenseVector, EmbeddingVectorSet, MultiVector, SparseVector};
