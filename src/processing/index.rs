//! Queryable handle over a built or loaded index.

use super::types::SearchError;
use crate::{
    embedding::EmbeddingClient,
    store::{IndexManifest, ScoredChunk, VectorIndex},
};
use std::sync::Arc;

/// Persisted chunk vectors paired with the embedding client that produced them.
pub struct PaperIndex {
    store: VectorIndex,
    embedder: Arc<dyn EmbeddingClient>,
}

impl PaperIndex {
    pub(crate) fn new(store: VectorIndex, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self { store, embedder }
    }

    /// Embed `query` and return the `k` nearest chunks, nearest first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, SearchError> {
        let mut vectors = self
            .embedder
            .generate_embeddings(vec![query.to_string()])
            .await?;
        let vector = vectors.pop().ok_or(SearchError::EmptyEmbedding)?;
        let hits = self.store.nearest(&vector, k)?;
        tracing::debug!(
            k,
            hits = hits.len(),
            top_score = hits.first().map(|hit| hit.score),
            "Similarity search complete"
        );
        Ok(hits)
    }

    /// Manifest of the underlying index.
    pub fn manifest(&self) -> &IndexManifest {
        self.store.manifest()
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl std::fmt::Debug for PaperIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperIndex")
            .field("dir", &self.store.dir())
            .field("chunks", &self.store.len())
            .field("embedding_model", &self.embedder.model_id())
            .finish()
    }
}
