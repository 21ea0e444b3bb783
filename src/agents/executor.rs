//! Single-agent task execution with a bounded tool-calling loop.

use super::{
    roles::{AgentRole, AgentTask},
    tools::{execute_tool, search_tool_definition},
};
use crate::{
    llm::{ChatClient, ChatMessage, ChatRequest, LlmClientError},
    metrics::PipelineMetrics,
    processing::SearchError,
    retrieval::SearchCapability,
};
use thiserror::Error;

/// Errors raised while an agent works on its task.
#[derive(Debug, Error)]
pub enum StageError {
    /// Chat provider call failed.
    #[error("{role} could not reach the language model: {source}")]
    Llm {
        /// Role of the failing agent.
        role: &'static str,
        /// Underlying provider error.
        #[source]
        source: LlmClientError,
    },
    /// Paper search requested by the agent failed.
    #[error("{role} failed to search the paper: {source}")]
    Search {
        /// Role of the failing agent.
        role: &'static str,
        /// Underlying search error.
        #[source]
        source: SearchError,
    },
    /// Model finished without producing any text.
    #[error("{role} returned an empty answer")]
    EmptyAnswer {
        /// Role of the failing agent.
        role: &'static str,
    },
}

/// Shared dependencies for running agent stages.
pub struct StageRunner<'a> {
    chat: &'a dyn ChatClient,
    search: &'a dyn SearchCapability,
    max_iterations: usize,
    metrics: &'a PipelineMetrics,
}

impl<'a> StageRunner<'a> {
    /// Create a runner allowing at most `max_iterations` model calls per stage.
    pub fn new(
        chat: &'a dyn ChatClient,
        search: &'a dyn SearchCapability,
        max_iterations: usize,
        metrics: &'a PipelineMetrics,
    ) -> Self {
        Self {
            chat,
            search,
            max_iterations: max_iterations.max(1),
            metrics,
        }
    }

    /// Run `task` as `role`, given the outputs of earlier stages as `context`.
    ///
    /// The model is called until it answers without requesting tools. The final permitted call
    /// is made without tools so the model has to answer.
    pub async fn run_stage(
        &self,
        role: &AgentRole,
        task: &AgentTask,
        context: &[String],
    ) -> Result<String, StageError> {
        let mut messages = vec![
            ChatMessage::system(role.system_prompt()),
            ChatMessage::user(task_prompt(task, context)),
        ];

        for iteration in 1..=self.max_iterations {
            let tools = if role.uses_search && iteration < self.max_iterations {
                vec![search_tool_definition()]
            } else {
                Vec::new()
            };
            let offered_tools = !tools.is_empty();
            tracing::debug!(
                role = role.role,
                iteration,
                max_iterations = self.max_iterations,
                messages = messages.len(),
                "Calling model"
            );

            let response = self
                .chat
                .complete(ChatRequest {
                    messages: messages.clone(),
                    tools,
                })
                .await
                .map_err(|source| StageError::Llm {
                    role: role.role,
                    source,
                })?;

            if !offered_tools || response.tool_calls.is_empty() {
                return match response.content {
                    Some(answer) if !answer.trim().is_empty() => {
                        tracing::info!(role = role.role, iteration, "Stage complete");
                        Ok(answer)
                    }
                    _ => Err(StageError::EmptyAnswer { role: role.role }),
                };
            }

            tracing::info!(
                role = role.role,
                tool_count = response.tool_calls.len(),
                "Model requested tool calls"
            );
            messages.push(ChatMessage::assistant(
                response.content,
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                self.metrics.record_tool_call();
                let output = execute_tool(call, self.search)
                    .await
                    .map_err(|source| StageError::Search {
                        role: role.role,
                        source,
                    })?;
                tracing::debug!(
                    tool_name = %call.name,
                    result_len = output.len(),
                    "Tool execution succeeded"
                );
                messages.push(ChatMessage::tool(call.id.clone(), output));
            }
        }

        // The last iteration never offers tools, so the loop always returns above.
        Err(StageError::EmptyAnswer { role: role.role })
    }
}

fn task_prompt(task: &AgentTask, context: &[String]) -> String {
    let mut prompt = format!(
        "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
You MUST return the actual complete content as the final answer, not a summary.",
        task.description, task.expected_output
    );
    if !context.is_empty() {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(&context.join("\n\n"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agents::{
            roles::{CONTENT_SUMMARIZER, RESEARCH_ANALYST, research_task, summarize_task},
            test_support::{FailingSearch, ScriptedChat, StaticSearch, answer, tool_call},
        },
        llm::ChatRole,
    };

    #[tokio::test]
    async fn tool_result_is_fed_back_to_model() {
        let chat = ScriptedChat::new(vec![
            tool_call("call_1", "search_research_paper", r#"{"query":"hypothesis"}"#),
            answer("The hypothesis is X."),
        ]);
        let search = StaticSearch::new("Found 1 relevant sections:\n\nChunk 1:\nX\n[Source: Page 0]");
        let metrics = PipelineMetrics::new();
        let runner = StageRunner::new(&chat, &search, 5, &metrics);

        let output = runner
            .run_stage(&RESEARCH_ANALYST, &research_task("hypothesis?"), &[])
            .await
            .expect("stage");

        assert_eq!(output, "The hypothesis is X.");
        assert_eq!(search.queries(), vec!["hypothesis"]);
        assert_eq!(metrics.snapshot().tool_calls, 1);

        let requests = chat.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.len(), 1);
        let tool_message = requests[1]
            .messages
            .iter()
            .find(|message| message.role == ChatRole::Tool)
            .expect("tool message");
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
        assert!(
            tool_message
                .content
                .as_deref()
                .is_some_and(|content| content.contains("[Source: Page 0]"))
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_answered_and_loop_continues() {
        let chat = ScriptedChat::new(vec![
            tool_call("call_1", "browse_web", "{}"),
            answer("done"),
        ]);
        let search = StaticSearch::new("unused");
        let metrics = PipelineMetrics::new();
        let runner = StageRunner::new(&chat, &search, 5, &metrics);

        let output = runner
            .run_stage(&RESEARCH_ANALYST, &research_task("q"), &[])
            .await
            .expect("stage");
        assert_eq!(output, "done");
        assert!(search.queries().is_empty());
        let last = chat.requests().pop().expect("request");
        assert!(last.messages.iter().any(|message| {
            message.role == ChatRole::Tool
                && message
                    .content
                    .as_deref()
                    .is_some_and(|content| content.contains("unknown tool"))
        }));
    }

    #[tokio::test]
    async fn final_iteration_is_sent_without_tools() {
        let chat = ScriptedChat::new(vec![
            tool_call("call_1", "search_research_paper", r#"{"query":"a"}"#),
            tool_call("call_2", "search_research_paper", r#"{"query":"b"}"#),
            answer("forced answer"),
        ]);
        let search = StaticSearch::new("context");
        let metrics = PipelineMetrics::new();
        let runner = StageRunner::new(&chat, &search, 3, &metrics);

        let output = runner
            .run_stage(&RESEARCH_ANALYST, &research_task("q"), &[])
            .await
            .expect("stage");
        assert_eq!(output, "forced answer");
        let requests = chat.requests();
        assert_eq!(requests.len(), 3);
        assert!(!requests[1].tools.is_empty());
        assert!(requests[2].tools.is_empty());
    }

    #[tokio::test]
    async fn search_failure_fails_the_stage() {
        let chat = ScriptedChat::new(vec![tool_call(
            "call_1",
            "search_research_paper",
            r#"{"query":"a"}"#,
        )]);
        let metrics = PipelineMetrics::new();
        let runner = StageRunner::new(&chat, &FailingSearch, 5, &metrics);

        let error = runner
            .run_stage(&RESEARCH_ANALYST, &research_task("q"), &[])
            .await
            .expect_err("search failure");
        assert!(matches!(
            error,
            StageError::Search {
                role: "Research Analyst",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn roles_without_search_get_no_tools_and_see_context() {
        let chat = ScriptedChat::new(vec![answer("summary")]);
        let search = StaticSearch::new("unused");
        let metrics = PipelineMetrics::new();
        let runner = StageRunner::new(&chat, &search, 5, &metrics);

        runner
            .run_stage(
                &CONTENT_SUMMARIZER,
                &summarize_task(),
                &["research notes".to_string()],
            )
            .await
            .expect("stage");

        let request = chat.requests().remove(0);
        assert!(request.tools.is_empty());
        assert_eq!(request.messages[0].role, ChatRole::System);
        let task = request.messages[1].content.as_deref().expect("task text");
        assert!(task.contains("This is the context you're working with:\nresearch notes"));
    }

    #[tokio::test]
    async fn blank_answer_is_an_error() {
        let chat = ScriptedChat::new(vec![answer("   ")]);
        let search = StaticSearch::new("unused");
        let metrics = PipelineMetrics::new();
        let runner = StageRunner::new(&chat, &search, 5, &metrics);

        let error = runner
            .run_stage(&CONTENT_SUMMARIZER, &summarize_task(), &[])
            .await
            .expect_err("empty");
        assert!(matches!(error, StageError::EmptyAnswer { .. }));
    }
}
