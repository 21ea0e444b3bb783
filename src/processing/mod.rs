//! Ingestion pipeline: PDF pages, chunking, embedding, and the persisted paper index.

pub mod chunking;
mod index;
pub mod pdf;
mod service;
pub mod types;

pub use index::PaperIndex;
pub use service::IndexService;
pub use types::{Chunk, ChunkingError, Document, IngestionError, ProcessingError, SearchError};
