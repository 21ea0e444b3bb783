//! Programmatic entry point: one-time index initialization and per-query crew runs.

use crate::{
    agents::{CrewError, ResearchCrew},
    config::{API_KEY_VARIABLE, Config},
    embedding::{EmbeddingClient, EmbeddingClientError, get_embedding_client},
    llm::{ChatClient, LlmClientError, get_chat_client},
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{IndexService, PaperIndex, ProcessingError},
    retrieval::PaperSearch,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced to callers of [`ResearchAssistant`].
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Provider credential is not configured.
    #[error("OPENAI_API_KEY not found in environment variables")]
    CredentialMissing,
    /// Embedding client could not be constructed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingClientError),
    /// Chat client could not be constructed.
    #[error(transparent)]
    Llm(#[from] LlmClientError),
    /// Index could not be built or loaded.
    #[error("Error initializing system: {0}")]
    Index(#[from] ProcessingError),
    /// Crew failed while answering.
    #[error(transparent)]
    Crew(#[from] CrewError),
}

/// Owns the paper index and the provider clients for the lifetime of the process.
pub struct ResearchAssistant {
    config: Config,
    metrics: Arc<PipelineMetrics>,
    embedder: Option<Arc<dyn EmbeddingClient>>,
    chat: Option<Arc<dyn ChatClient>>,
    index: Option<Arc<PaperIndex>>,
}

impl ResearchAssistant {
    /// Create an assistant whose provider clients are built from `config` on first use.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            metrics: Arc::new(PipelineMetrics::new()),
            embedder: None,
            chat: None,
            index: None,
        }
    }

    /// Create an assistant using the supplied provider clients.
    pub fn with_clients(
        config: Config,
        embedder: Arc<dyn EmbeddingClient>,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            embedder: Some(embedder),
            chat: Some(chat),
            ..Self::new(config)
        }
    }

    /// Build or load the paper index. Returns whether the system is ready to answer.
    ///
    /// Without a configured credential nothing is built and the index directory is untouched.
    pub async fn initialize_system(&mut self) -> bool {
        match self.ensure_index().await {
            Ok(_) => true,
            Err(AssistantError::CredentialMissing) => {
                tracing::warn!(
                    variable = API_KEY_VARIABLE,
                    "Credential not found; set it in the environment or a .env file"
                );
                false
            }
            Err(error) => {
                tracing::error!(error = %error, "Error initializing system");
                false
            }
        }
    }

    /// Answer `query` with the research crew, initializing the index first when needed.
    pub async fn query_research_paper(&mut self, query: &str) -> Result<String, AssistantError> {
        tracing::info!(query, "Processing query");
        let result = self.run_crew(query).await;
        self.metrics.record_query(result.is_ok());
        result
    }

    /// Index handle, once initialized.
    pub fn index(&self) -> Option<&Arc<PaperIndex>> {
        self.index.as_ref()
    }

    /// Counters accumulated by this assistant.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn run_crew(&mut self, query: &str) -> Result<String, AssistantError> {
        let index = self.ensure_index().await?;
        let chat = self.chat_client()?;
        let search = Arc::new(PaperSearch::new(index, self.config.search_default_limit));
        let crew = ResearchCrew::new(
            chat,
            search,
            self.config.agent_max_iterations,
            Arc::clone(&self.metrics),
        );
        Ok(crew.execute(query).await?)
    }

    async fn ensure_index(&mut self) -> Result<Arc<PaperIndex>, AssistantError> {
        if let Some(index) = &self.index {
            return Ok(Arc::clone(index));
        }
        if !self.config.has_credentials() {
            return Err(AssistantError::CredentialMissing);
        }

        let embedder = self.embedding_client()?;
        let service = IndexService::new(&self.config, embedder, Arc::clone(&self.metrics));
        let index = Arc::new(service.build_or_load().await?);
        tracing::info!(
            chunks = index.len(),
            model = %index.manifest().embedding_model,
            "System initialized"
        );
        self.index = Some(Arc::clone(&index));
        Ok(index)
    }

    fn embedding_client(&mut self) -> Result<Arc<dyn EmbeddingClient>, AssistantError> {
        if let Some(client) = &self.embedder {
            return Ok(Arc::clone(client));
        }
        let client = get_embedding_client(&self.config)?;
        self.embedder = Some(Arc::clone(&client));
        Ok(client)
    }

    fn chat_client(&mut self) -> Result<Arc<dyn ChatClient>, AssistantError> {
        if let Some(client) = &self.chat {
            return Ok(Arc::clone(client));
        }
        let client = get_chat_client(&self.config)?;
        self.chat = Some(Arc::clone(&client));
        Ok(client)
    }
}
