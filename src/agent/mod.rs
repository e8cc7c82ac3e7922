//! Agent module - LLM logic, prompt engineering, and the Gemini client
//!
//! This module handles all AI-related functionality including:
//! - Gemini API client behind the `LanguageModel` trait
//! - Message types and the per-request conversation buffer
//! - The system prompt template
//! - The agent loop that drives search rounds

mod agentic_loop;
mod client;
mod conversation;
pub mod prompts;
mod provider;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use agentic_loop::{
    AgentLoop, AgentOutput, LoopConfig, LoopOutcome, LoopTrace, FALLBACK_RESPONSE,
};
pub use client::GeminiClient;
pub use conversation::ConversationBuffer;
pub use prompts::PromptTemplate;
pub use provider::LanguageModel;
pub use types::*;
