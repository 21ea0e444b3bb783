//! Persisted vector index for the paper's chunks.

pub mod index;
pub mod payload;
pub mod types;

pub use index::VectorIndex;
pub use payload::compute_chunk_hash;
pub use types::{IndexManifest, IndexSettings, ScoredChunk, StoreError, StoredChunk};
