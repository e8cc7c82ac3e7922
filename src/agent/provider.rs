//! Language model trait - the seam between the agent loop and an LLM backend
//!
//! The agent loop only talks to `dyn LanguageModel`, so tests can substitute
//! scripted models and the hosted backend can be swapped without touching the
//! loop.

use async_trait::async_trait;

use crate::agent::types::{Message, ModelReply, ToolDefinition};
use crate::error::{Error, Result};

/// Abstract interface for a hosted language model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier used for requests
    fn model(&self) -> &str;

    /// Send the conversation with the tools the model may call.
    ///
    /// Returns either free text or a single tool invocation. Failures are
    /// normalized to [`Error::Provider`] (or the transport variants) at this
    /// boundary.
    async fn invoke(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<ModelReply>;

    /// Generate text for a single prompt, with no tools bound
    async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(Error::InvalidInput("Prompt cannot be empty".to_string()));
        }

        match self.invoke(&[Message::user(prompt)], &[]).await? {
            ModelReply::Text(text) => Ok(text),
            ModelReply::ToolCall { invocation, .. } => Err(Error::Provider(format!(
                "Model requested tool '{}' without tools bound",
                invocation.name
            ))),
        }
    }
}
