//! Chat-completion client used by the agent roles.
//!
//! The OpenAI adapter speaks the `/chat/completions` protocol with function calling. Model and
//! temperature are fixed when the client is built, so every role in a crew shares them.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced while calling the chat provider.
#[derive(Debug, Error)]
pub enum LlmClientError {
    /// Provider was unreachable or not configured.
    #[error("Chat provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Chat completion failed: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Author of a message in a chat transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    /// Instructions framing the agent's persona.
    System,
    /// Task text handed to the agent.
    User,
    /// Model output, possibly requesting tool calls.
    Assistant,
    /// Result of a tool call, linked by call id.
    Tool,
}

impl ChatRole {
    fn as_str(self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::Tool => "tool",
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Provider-assigned identifier echoed back with the result.
    pub id: String,
    /// Name of the tool to run.
    pub name: String,
    /// Raw JSON arguments as produced by the model.
    pub arguments: String,
}

/// One entry of a chat transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Author of the message.
    pub role: ChatRole,
    /// Text content; assistant messages that only call tools may have none.
    pub content: Option<String>,
    /// Tool calls requested by an assistant message.
    pub tool_calls: Vec<ToolCall>,
    /// For tool messages, the call this message answers.
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// System message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(ChatRole::System, content)
    }

    /// User message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(ChatRole::User, content)
    }

    /// Assistant message carrying the model's text and requested tool calls.
    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Tool result answering the call `tool_call_id`.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    fn to_wire(&self) -> Value {
        let mut message = json!({
            "role": self.role.as_str(),
            "content": self.content,
        });
        if !self.tool_calls.is_empty() {
            message["tool_calls"] = Value::Array(
                self.tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": { "name": call.name, "arguments": call.arguments }
                        })
                    })
                    .collect(),
            );
        }
        if let Some(id) = &self.tool_call_id {
            message["tool_call_id"] = Value::String(id.clone());
        }
        message
    }
}

/// Provider-agnostic description of a callable tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    /// Function name the model uses to call the tool.
    pub name: String,
    /// Natural language description shown to the model.
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// Payload passed to [`ChatClient::complete`].
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Transcript so far.
    pub messages: Vec<ChatMessage>,
    /// Tools the model may call; empty forces a plain answer.
    pub tools: Vec<ToolDefinition>,
}

/// Model turn returned by the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    /// Text produced by the model, if any.
    pub content: Option<String>,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCall>,
}

/// Interface implemented by chat-completion providers.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Run one completion over the transcript.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmClientError>;

    /// Identifier of the model answering requests.
    fn model_id(&self) -> &str;
}

/// Build the chat client described by the configuration.
pub fn get_chat_client(config: &Config) -> Result<Arc<dyn ChatClient>, LlmClientError> {
    let api_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| LlmClientError::ProviderUnavailable("OPENAI_API_KEY is not set".into()))?;
    Ok(Arc::new(OpenAiChatClient::new(
        config.openai_base_url.clone(),
        api_key,
        config.chat_model.clone(),
        config.chat_temperature,
    )?))
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiChatClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiChatClient {
    /// Construct a client with a fixed model and temperature.
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        temperature: f32,
    ) -> Result<Self, LlmClientError> {
        let http = Client::builder()
            .user_agent("research-rag/chat")
            .build()
            .map_err(|error| LlmClientError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url,
            api_key,
            model,
            temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn payload(&self, request: &ChatRequest) -> Value {
        let mut payload = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": request
                .messages
                .iter()
                .map(ChatMessage::to_wire)
                .collect::<Vec<_>>(),
        });
        if !request.tools.is_empty() {
            payload["tools"] = Value::Array(
                request
                    .tools
                    .iter()
                    .map(|tool| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": tool.name,
                                "description": tool.description,
                                "parameters": tool.parameters,
                            }
                        })
                    })
                    .collect(),
            );
        }
        payload
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmClientError> {
        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending chat completion"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.payload(&request))
            .send()
            .await
            .map_err(|error| {
                LlmClientError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(LlmClientError::ProviderUnavailable(format!(
                "endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmClientError::GenerationFailed(format!(
                "provider returned {status}: {body}"
            )));
        }

        let body: CompletionResponse = response.json().await.map_err(|error| {
            LlmClientError::InvalidResponse(format!("failed to decode completion: {error}"))
        })?;

        let message = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| LlmClientError::InvalidResponse("response contained no choices".into()))?;

        Ok(ChatResponse {
            content: message.content,
            tool_calls: message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|call| ToolCall {
                    id: call.id,
                    name: call.function.name,
                    arguments: call.function.arguments,
                })
                .collect(),
        })
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer) -> OpenAiChatClient {
        OpenAiChatClient::new(server.base_url(), "sk-test".into(), "gpt-4o".into(), 0.7)
            .expect("client")
    }

    #[tokio::test]
    async fn client_returns_plain_answer() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .json_body_partial(r#"{ "model": "gpt-4o" }"#);
                then.status(200).json_body(json!({
                    "choices": [
                        { "index": 0, "message": { "role": "assistant", "content": "Answer" } }
                    ]
                }));
            })
            .await;

        let response = client_for(&server)
            .complete(ChatRequest {
                messages: vec![ChatMessage::system("persona"), ChatMessage::user("task")],
                tools: Vec::new(),
            })
            .await
            .expect("completion");

        mock.assert_async().await;
        assert_eq!(response.content.as_deref(), Some("Answer"));
        assert!(response.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn client_decodes_tool_calls() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{
                        "index": 0,
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_1",
                                "type": "function",
                                "function": {
                                    "name": "search_research_paper",
                                    "arguments": "{\"query\":\"methodology\"}"
                                }
                            }]
                        }
                    }]
                }));
            })
            .await;

        let response = client_for(&server)
            .complete(ChatRequest {
                messages: vec![ChatMessage::user("task")],
                tools: vec![ToolDefinition {
                    name: "search_research_paper".into(),
                    description: "search".into(),
                    parameters: json!({ "type": "object" }),
                }],
            })
            .await
            .expect("completion");

        assert_eq!(response.content, None);
        assert_eq!(
            response.tool_calls,
            vec![ToolCall {
                id: "call_1".into(),
                name: "search_research_paper".into(),
                arguments: "{\"query\":\"methodology\"}".into(),
            }]
        );
    }

    #[tokio::test]
    async fn client_reports_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(500).body("boom");
            })
            .await;

        let error = client_for(&server)
            .complete(ChatRequest::default())
            .await
            .expect_err("error response");

        assert!(
            matches!(&error, LlmClientError::GenerationFailed(message) if message.contains("500")),
            "unexpected error: {error}"
        );
    }

    #[tokio::test]
    async fn client_rejects_empty_choices() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let error = client_for(&server)
            .complete(ChatRequest::default())
            .await
            .expect_err("no choices");

        assert!(matches!(error, LlmClientError::InvalidResponse(_)));
    }

    #[test]
    fn tool_messages_carry_call_ids_on_the_wire() {
        let wire = ChatMessage::tool("call_9", "result").to_wire();
        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "call_9");
        assert_eq!(wire["content"], "result");

        let assistant = ChatMessage::assistant(
            None,
            vec![ToolCall {
                id: "call_9".into(),
                name: "search_research_paper".into(),
                arguments: "{}".into(),
            }],
        )
        .to_wire();
        assert_eq!(assistant["tool_calls"][0]["function"]["name"], "search_research_paper");
        assert!(assistant["content"].is_null());
    }
}
