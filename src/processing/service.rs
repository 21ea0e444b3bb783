//! Index service coordinating ingestion, chunking, embedding, and persistence.

use crate::{
    config::Config,
    embedding::{EmbeddingClient, EmbeddingClientError},
    metrics::PipelineMetrics,
    processing::{
        chunking::chunk_documents,
        index::PaperIndex,
        pdf::load_pages,
        types::{Chunk, Document, ProcessingError},
    },
    store::{IndexSettings, StoredChunk, VectorIndex, compute_chunk_hash, payload},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builds the paper index from the configured PDF or reopens a persisted one.
///
/// Holds the embedding client used for both building and querying so that stored vectors and
/// query vectors always come from the same model.
pub struct IndexService {
    embedder: Arc<dyn EmbeddingClient>,
    metrics: Arc<PipelineMetrics>,
    pdf_path: PathBuf,
    index_dir: PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl IndexService {
    /// Create a service for the paths and chunking settings in `config`.
    pub fn new(
        config: &Config,
        embedder: Arc<dyn EmbeddingClient>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            embedder,
            metrics,
            pdf_path: config.pdf_path.clone(),
            index_dir: config.index_dir.clone(),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    /// Settings recorded in, and checked against, the index manifest.
    pub fn settings(&self) -> IndexSettings {
        IndexSettings {
            embedding_model: self.embedder.model_id().to_string(),
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }

    /// Load the index when its directory is populated; otherwise ingest the PDF and build it.
    pub async fn build_or_load(&self) -> Result<PaperIndex, ProcessingError> {
        if VectorIndex::is_populated(&self.index_dir) {
            tracing::info!(dir = %self.index_dir.display(), "Loading existing index");
            return self.load(&self.index_dir);
        }
        tracing::info!(
            pdf = %self.pdf_path.display(),
            dir = %self.index_dir.display(),
            "Building index from PDF"
        );
        self.build_from_pdf(&self.pdf_path).await
    }

    /// Ingest `path`, chunk its pages, and build the index.
    pub async fn build_from_pdf(&self, path: &Path) -> Result<PaperIndex, ProcessingError> {
        let documents = load_pages(path)?;
        self.build_from_documents(&documents).await
    }

    /// Chunk already-loaded pages and build the index.
    pub async fn build_from_documents(
        &self,
        documents: &[Document],
    ) -> Result<PaperIndex, ProcessingError> {
        let chunks = chunk_documents(documents, self.chunk_size, self.chunk_overlap)?;
        tracing::debug!(
            pages = documents.len(),
            chunks = chunks.len(),
            chunk_size = self.chunk_size,
            overlap = self.chunk_overlap,
            "Pages chunked"
        );
        let index = self.build(chunks).await?;
        self.metrics
            .record_index_build(documents.len() as u64, index.len() as u64);
        Ok(index)
    }

    /// Embed every chunk and persist the vectors under the configured index directory.
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<PaperIndex, ProcessingError> {
        if chunks.is_empty() {
            return Err(ProcessingError::NoContent(
                self.pdf_path.display().to_string(),
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = self.embedder.generate_embeddings(texts).await?;
        if vectors.len() != chunks.len() {
            return Err(ProcessingError::Embedding(
                EmbeddingClientError::InvalidResponse(format!(
                    "expected {} vectors, received {}",
                    chunks.len(),
                    vectors.len()
                )),
            ));
        }

        let records: Vec<StoredChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| StoredChunk {
                id: payload::generate_chunk_id(),
                page: chunk.page,
                chunk_index: chunk.index,
                chunk_hash: compute_chunk_hash(&chunk.text),
                text: chunk.text,
                vector,
            })
            .collect();

        let store = VectorIndex::create(
            &self.index_dir,
            &self.settings(),
            &self.pdf_path.display().to_string(),
            records,
        )?;
        tracing::info!(
            dir = %self.index_dir.display(),
            chunks = store.len(),
            dimension = store.manifest().dimension,
            "Index built"
        );
        Ok(PaperIndex::new(store, Arc::clone(&self.embedder)))
    }

    /// Open a persisted index without recomputing any embeddings.
    pub fn load(&self, location: &Path) -> Result<PaperIndex, ProcessingError> {
        let store = VectorIndex::open(location, &self.settings())?;
        tracing::info!(
            dir = %location.display(),
            chunks = store.len(),
            source = %store.manifest().source,
            "Index loaded"
        );
        Ok(PaperIndex::new(store, Arc::clone(&self.embedder)))
    }
}
