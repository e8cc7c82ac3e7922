//! The `web_search` tool offered to the model

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::traits::{format_results_for_prompt, SearchClient};
use crate::agent::{ToolDefinition, ToolInvocation};
use crate::Error;

/// Name the model uses to request a search
pub const WEB_SEARCH_TOOL: &str = "web_search";

/// Default number of results fetched per search
pub const DEFAULT_NUM_RESULTS: usize = 5;

/// Result of running the tool, as fed back to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Whether the search succeeded
    pub success: bool,
    /// Text for the tool-result message
    pub content: String,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(content: impl Into<String>) -> Self {
        ToolResult {
            success: true,
            content: content.into(),
        }
    }

    /// Create a failed result with a human-readable message
    pub fn failure(error: impl std::fmt::Display) -> Self {
        ToolResult {
            success: false,
            content: format!("An error occurred during search: {}", error),
        }
    }
}

/// Web search tool backed by a [`SearchClient`]
#[derive(Clone)]
pub struct WebSearchTool {
    client: Arc<dyn SearchClient>,
    num_results: usize,
}

impl WebSearchTool {
    /// Create a new tool fetching `num_results` per search
    pub fn new(client: Arc<dyn SearchClient>, num_results: usize) -> Self {
        Self {
            client,
            num_results,
        }
    }

    /// Schema offered to the model
    pub fn definition() -> ToolDefinition {
        ToolDefinition {
            name: WEB_SEARCH_TOOL.to_string(),
            description: "Search the web for up-to-date information. Use for real-time \
                          information, news, weather, events and other time-sensitive facts."
                .to_string(),
            parameters: Self::parameters_schema(),
        }
    }

    fn parameters_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    /// Run the search for `invocation`. Failures are reported in the result
    /// rather than returned as errors so the model can answer without data.
    pub async fn execute(&self, invocation: &ToolInvocation) -> ToolResult {
        let query = match invocation.str_arg("query") {
            Some(q) => q,
            None => {
                let err = Error::InvalidInput("Missing 'query' parameter".to_string());
                warn!("web_search called without a query: {}", invocation.arguments);
                return ToolResult::failure(err);
            }
        };

        info!("Executing web_search: {:?}", query);

        match self.client.search(query, self.num_results).await {
            Ok(results) => {
                info!("web_search returned {} results", results.len());
                ToolResult::success(format_results_for_prompt(&results))
            }
            Err(e) => {
                warn!("web_search failed: {}", e);
                ToolResult::failure(e)
            }
        }
    }
}
