//! Tools exposed to agents through function calling.

use crate::{
    llm::{ToolCall, ToolDefinition},
    processing::SearchError,
    retrieval::SearchCapability,
};
use serde::Deserialize;
use serde_json::json;

/// Name the model uses to request a paper search.
pub const SEARCH_TOOL_NAME: &str = "search_research_paper";

const SEARCH_TOOL_DESCRIPTION: &str = "Search the research paper PDF for relevant information based on a query. \
Use this tool to find specific information, facts, or sections from the research paper.";

#[derive(Debug, Deserialize)]
struct SearchArguments {
    query: String,
}

/// Function definition advertised to the model for paper search.
pub fn search_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: SEARCH_TOOL_NAME.to_string(),
        description: SEARCH_TOOL_DESCRIPTION.to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for in the research paper"
                }
            },
            "required": ["query"]
        }),
    }
}

/// Run a tool call requested by the model and return the content to send back.
///
/// Unknown tools and unparsable arguments are reported to the model as text so it can
/// correct itself. A failing search is returned as an error.
pub async fn execute_tool(
    call: &ToolCall,
    search: &dyn SearchCapability,
) -> Result<String, SearchError> {
    if call.name != SEARCH_TOOL_NAME {
        tracing::warn!(tool_name = %call.name, "Model requested unknown tool");
        return Ok(format!(
            "Error: unknown tool '{}'. Available tools: {SEARCH_TOOL_NAME}",
            call.name
        ));
    }

    let arguments: SearchArguments = match serde_json::from_str(&call.arguments) {
        Ok(arguments) => arguments,
        Err(error) => {
            tracing::warn!(
                tool_name = %call.name,
                raw_args = %call.arguments,
                error = %error,
                "Failed to parse tool arguments"
            );
            return Ok(format!(
                "Error: invalid arguments for {SEARCH_TOOL_NAME}: {error}. Expected {{\"query\": string}}"
            ));
        }
    };

    tracing::debug!(tool_name = %call.name, query = %arguments.query, "Executing tool");
    search.search(&arguments.query).await
}
