//! Shared types used by the file-backed vector store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Version of the on-disk layout written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Errors returned while persisting or reading the index.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed (unwritable directory, unreadable file).
    #[error("Index I/O failed at {path}: {source}")]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// File contents could not be encoded or decoded.
    #[error("Index file {path} could not be serialized: {source}")]
    Serialization {
        /// File being written or read.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Persisted index was produced with different settings than the active configuration.
    #[error(
        "Index at {path} was built with {field} = {found}, but the current configuration uses {expected}; delete the directory to rebuild"
    )]
    ConfigMismatch {
        /// Index directory.
        path: PathBuf,
        /// Setting that differs.
        field: &'static str,
        /// Value required by the active configuration.
        expected: String,
        /// Value recorded in the manifest.
        found: String,
    },
    /// A vector does not have the dimension recorded for the index.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension recorded for the index.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },
    /// Directory content is inconsistent with its manifest.
    #[error("Index at {path} is corrupt: {reason}")]
    Corrupt {
        /// Index directory.
        path: PathBuf,
        /// What was found to be wrong.
        reason: String,
    },
}

/// Settings that must match between the process that built an index and the one loading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    /// Embedding model producing the stored vectors.
    pub embedding_model: String,
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters.
    pub chunk_overlap: usize,
}

/// Metadata written next to the chunk records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Layout version, see [`FORMAT_VERSION`].
    pub format_version: u32,
    /// Embedding model used at build time.
    pub embedding_model: String,
    /// Dimension shared by every stored vector.
    pub dimension: usize,
    /// Chunk window size used at build time.
    pub chunk_size: usize,
    /// Chunk overlap used at build time.
    pub chunk_overlap: usize,
    /// Number of chunk records.
    pub chunk_count: usize,
    /// Source document the chunks came from.
    pub source: String,
    /// Digest over the settings above; compared on load.
    pub fingerprint: String,
    /// RFC 3339 build timestamp.
    pub created_at: String,
}

/// One persisted chunk and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Random identifier assigned at build time.
    pub id: String,
    /// Page of the source document (0-based).
    pub page: usize,
    /// Position of the chunk within its page.
    pub chunk_index: usize,
    /// Chunk text.
    pub text: String,
    /// SHA-256 of the text.
    pub chunk_hash: String,
    /// Embedding vector.
    pub vector: Vec<f32>,
}

/// Search hit produced by a nearest-neighbour query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    /// Chunk text.
    pub text: String,
    /// Source page (0-based).
    pub page: usize,
    /// Cosine similarity to the query vector.
    pub score: f32,
}
