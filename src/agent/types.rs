//! Type definitions for the agent module

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message providing context and instructions
    System,
    /// User message
    User,
    /// Assistant (AI) response
    Assistant,
    /// Tool result
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A structured request from the model to run a named tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Correlation ID, echoed back on the tool-result message
    pub id: String,
    /// Name of the tool to run
    pub name: String,
    /// Arguments as a JSON object
    pub arguments: Value,
    /// Opaque provider token that must be echoed back with the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_signature: Option<String>,
}

impl ToolInvocation {
    /// Create a new invocation
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        ToolInvocation {
            id: id.into(),
            name: name.into(),
            arguments,
            thought_signature: None,
        }
    }

    /// Attach the provider's thought signature
    pub fn with_thought_signature(mut self, signature: Option<String>) -> Self {
        self.thought_signature = signature;
        self
    }

    /// Read a string argument
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
    /// Tool name (for tool result messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool call ID (for tool result messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool invocation requested by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_invocation: Option<ToolInvocation>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            role,
            content: content.into(),
            name: None,
            tool_call_id: None,
            tool_invocation: None,
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message that requests a tool, keeping any text
    /// the model produced alongside the call
    pub fn assistant_tool_call(content: impl Into<String>, invocation: ToolInvocation) -> Self {
        Message {
            tool_invocation: Some(invocation),
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Create a new tool result message answering `invocation`
    pub fn tool(invocation: &ToolInvocation, content: impl Into<String>) -> Self {
        Message {
            name: Some(invocation.name.clone()),
            tool_call_id: Some(invocation.id.clone()),
            ..Self::new(Role::Tool, content)
        }
    }
}

/// What the model produced for one tool-bound invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Free text answer
    Text(String),
    /// Request to run a tool, with any text emitted in the same turn
    ToolCall {
        text: String,
        invocation: ToolInvocation,
    },
}

impl ModelReply {
    /// A tool call with no accompanying text
    pub fn tool_call(invocation: ToolInvocation) -> Self {
        ModelReply::ToolCall {
            text: String::new(),
            invocation,
        }
    }

    /// Convert into the assistant message that records this reply
    pub fn into_message(self) -> Message {
        match self {
            ModelReply::Text(text) => Message::assistant(text),
            ModelReply::ToolCall { text, invocation } => {
                Message::assistant_tool_call(text, invocation)
            }
        }
    }
}

/// Tool definition offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    pub description: String,
    /// JSON Schema for function parameters
    pub parameters: Value,
}
