//! Core data types and error definitions for the ingestion pipeline.

use crate::{embedding::EmbeddingClientError, store::StoreError};
use std::path::PathBuf;
use thiserror::Error;

/// One page of the source PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Page index within the PDF (0-based).
    pub page: usize,
    /// Text extracted from the page.
    pub text: String,
}

/// Contiguous character window taken from a single [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Page the chunk was taken from.
    pub page: usize,
    /// Position of the chunk within its page.
    pub index: usize,
    /// Chunk text.
    pub text: String,
}

/// Errors raised while reading the source PDF.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// File is missing or unreadable.
    #[error("Failed to read PDF at {path}: {source}")]
    Io {
        /// Requested PDF path.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// Bytes could not be parsed as a PDF.
    #[error("Failed to parse PDF at {path}: {message}")]
    Parse {
        /// Requested PDF path.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
    /// PDF parsed but contains no pages.
    #[error("PDF at {0} has no pages")]
    Empty(PathBuf),
}

/// Errors produced while splitting documents into chunks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// Chunk size is zero.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap would keep the window from advancing.
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge {
        /// Configured window size.
        chunk_size: usize,
        /// Configured overlap.
        overlap: usize,
    },
}

/// Errors emitted while building or loading the paper index.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// PDF could not be ingested.
    #[error(transparent)]
    Ingestion(#[from] IngestionError),
    /// Chunking step failed to segment the document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Embedding provider failed to produce vectors for the chunks.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Index could not be persisted or opened.
    #[error("Index persistence failed: {0}")]
    Store(#[from] StoreError),
    /// Source document produced nothing to index.
    #[error("No indexable text found in {0}")]
    NoContent(String),
}

/// Errors emitted while orchestrating similarity searches.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Embedding provider failed to return vectors for the query text.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Index rejected the query.
    #[error("Index search failed: {0}")]
    Store(#[from] StoreError),
    /// Embedding provider returned no vectors.
    #[error("Embedding provider returned no vectors for the query")]
    EmptyEmbedding,
}
