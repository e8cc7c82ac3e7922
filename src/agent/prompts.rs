//! Prompt templates and engineering

use crate::error::{Error, Result};
use handlebars::Handlebars;
use serde::Serialize;

/// A prompt template using Handlebars syntax
pub struct PromptTemplate {
    /// Template name
    name: String,
    /// Handlebars registry
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(name: impl Into<String>, template: &str) -> Result<Self> {
        let name = name.into();
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        // prompts are plain text, not HTML
        registry.register_escape_fn(handlebars::no_escape);

        registry
            .register_template_string(&name, template)
            .map_err(|e| Error::Internal(format!("Invalid template: {}", e)))?;

        Ok(PromptTemplate { name, registry })
    }

    /// Render the template with given data
    pub fn render<T: Serialize>(&self, data: &T) -> Result<String> {
        Ok(self.registry.render(&self.name, data)?)
    }
}

/// Instruction that opens every conversation
pub const SYSTEM_PROMPT: &str = "\
You are a helpful AI assistant.

Follow these guidelines when answering the user's question:

1. Use the web search tool for questions that need up-to-date information (news, weather, real-time data, etc.).
2. Answer general knowledge questions directly.
3. Keep answers clear and concise.
4. Answer in {{language}}.
";

#[derive(Serialize)]
struct SystemPromptData<'a> {
    language: &'a str,
}

/// Render the system instruction for the given answer language
pub fn system_prompt(language: &str) -> Result<String> {
    let template = PromptTemplate::new("system", SYSTEM_PROMPT)?;
    template.render(&SystemPromptData { language })
}
