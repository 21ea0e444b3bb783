//! Retrieval facade rendering search hits into a cited text block for the agents.

use crate::{
    processing::{PaperIndex, SearchError},
    store::ScoredChunk,
};
use async_trait::async_trait;
use std::sync::Arc;

const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Search capability handed to agents that are allowed to consult the paper.
#[async_trait]
pub trait SearchCapability: Send + Sync {
    /// Return the formatted context block for `query`.
    async fn search(&self, query: &str) -> Result<String, SearchError>;
}

/// Top-k search over the paper index.
#[derive(Debug, Clone)]
pub struct PaperSearch {
    index: Arc<PaperIndex>,
    limit: usize,
}

impl PaperSearch {
    /// Search `index`, returning at most `limit` sections per query.
    pub fn new(index: Arc<PaperIndex>, limit: usize) -> Self {
        Self { index, limit }
    }

    /// Retrieve the nearest chunks for `query` and render them with page citations.
    pub async fn search_research_paper(&self, query: &str) -> Result<String, SearchError> {
        let hits = self.index.search(query, self.limit).await?;
        tracing::debug!(hits = hits.len(), limit = self.limit, "Paper searched");
        Ok(format_search_results(&hits))
    }
}

#[async_trait]
impl SearchCapability for PaperSearch {
    async fn search(&self, query: &str) -> Result<String, SearchError> {
        self.search_research_paper(query).await
    }
}

/// Render hits as numbered sections under a count header.
pub fn format_search_results(hits: &[ScoredChunk]) -> String {
    let sections: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(position, hit)| {
            format!(
                "Chunk {}:\n{}\n[Source: Page {}]",
                position + 1,
                hit.text,
                hit.page
            )
        })
        .collect();
    format!(
        "Found {} relevant sections:\n\n{}",
        hits.len(),
        sections.join(SECTION_SEPARATOR)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, EmbeddingProvider},
        embedding::HashingEmbeddingClient,
        metrics::PipelineMetrics,
        processing::{Document, IndexService},
    };

    fn hit(text: &str, page: usize) -> ScoredChunk {
        ScoredChunk {
            text: text.into(),
            page,
            score: 0.5,
        }
    }

    #[test]
    fn two_hits_render_header_and_citations() {
        let rendered = format_search_results(&[hit("first", 0), hit("second", 4)]);

        assert!(rendered.starts_with("Found 2 relevant sections:\n\n"));
        assert_eq!(rendered.matches("Chunk ").count(), 2);
        assert_eq!(rendered.matches("[Source: Page ").count(), 2);
        assert_eq!(
            rendered,
            "Found 2 relevant sections:\n\nChunk 1:\nfirst\n[Source: Page 0]\n\n---\n\nChunk 2:\nsecond\n[Source: Page 4]"
        );
    }

    #[test]
    fn no_hits_render_only_header() {
        assert_eq!(format_search_results(&[]), "Found 0 relevant sections:\n\n");
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = Config {
            embedding_provider: EmbeddingProvider::Hashing,
            index_dir: temp.path().join("db"),
            chunk_size: 30,
            chunk_overlap: 5,
            ..Config::default()
        };
        let service = IndexService::new(
            &config,
            Arc::new(HashingEmbeddingClient::new(128)),
            Arc::new(PipelineMetrics::new()),
        );
        let pages: Vec<Document> = (0..4)
            .map(|page| Document {
                page,
                text: format!("Section {page} discusses attention heads and layer norms."),
            })
            .collect();
        let index = service.build_from_documents(&pages).await.expect("build");
        assert!(index.len() > 2);

        let search = PaperSearch::new(Arc::new(index), 2);
        let rendered = search
            .search_research_paper("attention heads")
            .await
            .expect("search");
        assert!(rendered.starts_with("Found 2 relevant sections:"));
        assert!(!rendered.contains("Chunk 3:"));
    }
}
