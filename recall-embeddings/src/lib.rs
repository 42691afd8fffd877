//! # recall-embeddings
//!
//! Multi-representation embedding layer. Every document gets a dense vector
//! (text or code model), a SPLADE sparse vector, and a ColBERT multi-vector.
//! Models load lazily behind a shared [`ModelHandle`].
//!
//! ## Architecture
//!
//! ```text
//! EmbeddingEngine
//! ├── DenseEmbedder (text)   ─┐
//! ├── DenseEmbedder (code)    │  each owns an Arc<ModelHandle>
//! ├── SparseEmbedder (SPLADE) │  └── BackendLoader → InferenceBackend
//! └── MultiVectorEmbedder    ─┘       └── OnnxBackend (ort + tokenizers)
//!
//! EmbeddingCache (multi-vectors by document id)
//! └── LruIndex (slab + intrusive list, O(1) touch/evict)
//! ```

pub mod cache;
pub mod dense;
pub mod engine;
pub mod handle;
pub mod multi_vector;
pub mod providers;
pub mod similarity;
pub mod sparse;

pub use cache::{CacheEntry, CacheStats, EmbeddingCache};
pub use dense::DenseEmbedder;
pub use engine::{EmbeddingEngine, EngineLoaders};
pub use handle::ModelHandle;
pub use multi_vector::{MultiVectorEmbedder, Role};
pub use providers::{create_loader, OnnxBackend, OnnxLoader};
pub use sparse::{splade_pool, SparseEmbedder};
