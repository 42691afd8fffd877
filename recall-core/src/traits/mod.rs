pub mod clock;
pub mod embedding;
pub mod vector_store;

pub use clock::{Clock, SystemClock};
pub use embedding::{BackendLoader, InferenceBackend};
pub use vector_store::VectorStore;
