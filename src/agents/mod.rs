//! Research crew: three agents answering a question about the paper in sequence.
//!
//! The Research Analyst searches the paper, the Content Summarizer condenses its findings, and the
//! Q&A Specialist writes the final answer from both. Each stage sees only the query and the
//! outputs of the stages before it.

pub mod executor;
pub mod roles;
pub mod tools;

use crate::{llm::ChatClient, metrics::PipelineMetrics, retrieval::SearchCapability};
use executor::{StageError, StageRunner};
use roles::{
    CONTENT_SUMMARIZER, QA_SPECIALIST, RESEARCH_ANALYST, answer_task, research_task,
    summarize_task,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while the crew works on a query.
#[derive(Debug, Error)]
pub enum CrewError {
    /// One of the stages failed; later stages were not run.
    #[error("Crew execution failed: {0}")]
    Stage(#[from] StageError),
}

/// Ordered research, summary, and answer stages over a shared chat client.
pub struct ResearchCrew {
    chat: Arc<dyn ChatClient>,
    search: Arc<dyn SearchCapability>,
    max_iterations: usize,
    metrics: Arc<PipelineMetrics>,
}

impl ResearchCrew {
    /// Assemble a crew whose Research Analyst searches through `search`.
    pub fn new(
        chat: Arc<dyn ChatClient>,
        search: Arc<dyn SearchCapability>,
        max_iterations: usize,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            chat,
            search,
            max_iterations,
            metrics,
        }
    }

    /// Run all three stages for `query` and return the Q&A Specialist's answer.
    pub async fn execute(&self, query: &str) -> Result<String, CrewError> {
        let runner = StageRunner::new(
            self.chat.as_ref(),
            self.search.as_ref(),
            self.max_iterations,
            &self.metrics,
        );
        tracing::info!(model = self.chat.model_id(), "Crew started");

        let findings = runner
            .run_stage(&RESEARCH_ANALYST, &research_task(query), &[])
            .await?;
        let summary = runner
            .run_stage(
                &CONTENT_SUMMARIZER,
                &summarize_task(),
                std::slice::from_ref(&findings),
            )
            .await?;
        let answer = runner
            .run_stage(&QA_SPECIALIST, &answer_task(query), &[findings, summary])
            .await?;

        tracing::info!(answer_len = answer.len(), "Crew finished");
        Ok(answer)
    }
}
