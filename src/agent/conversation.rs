//! Conversation buffer for a single agent run

use crate::agent::types::{Message, Role};
use crate::error::{Error, Result};

/// Ordered, append-only list of messages owned by one agent run.
///
/// The first message is always the system instruction, and a tool result is
/// only accepted when an earlier assistant message carries the invocation it
/// answers.
#[derive(Debug, Clone)]
pub struct ConversationBuffer {
    messages: Vec<Message>,
}

impl ConversationBuffer {
    /// Seed a buffer with the system instruction and the user query
    pub fn new(system_prompt: impl Into<String>, user_query: impl Into<String>) -> Self {
        ConversationBuffer {
            messages: vec![Message::system(system_prompt), Message::user(user_query)],
        }
    }

    /// Append a message, enforcing the buffer invariants
    pub fn push(&mut self, message: Message) -> Result<()> {
        match message.role {
            Role::System => {
                return Err(Error::Internal(
                    "system message can only open the conversation".to_string(),
                ));
            }
            Role::Tool => {
                let call_id = message.tool_call_id.as_deref().ok_or_else(|| {
                    Error::Internal("tool result without tool_call_id".to_string())
                })?;
                if !self.has_invocation(call_id) {
                    return Err(Error::Internal(format!(
                        "tool result '{}' has no matching invocation",
                        call_id
                    )));
                }
            }
            Role::User | Role::Assistant => {}
        }
        self.messages.push(message);
        Ok(())
    }

    fn has_invocation(&self, call_id: &str) -> bool {
        self.messages.iter().any(|m| {
            m.role == Role::Assistant
                && m.tool_invocation.as_ref().is_some_and(|inv| inv.id == call_id)
        })
    }

    /// All messages in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Give up the buffer
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
