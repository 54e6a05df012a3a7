//! Ordered conversation history owned by one turn at a time.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::message::{ModelMessage, Role};

/// Append-only sequence of messages for one chat session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ConversationHistory {
    messages: Vec<ModelMessage>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a history with a system prompt.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ModelMessage::system(prompt)],
        }
    }

    pub fn push(&mut self, message: ModelMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ModelMessage> {
        self.messages.last()
    }

    /// Roles in order, handy for assertions and debug logging.
    pub fn roles(&self) -> Vec<Role> {
        self.messages.iter().map(|m| m.role).collect()
    }

    /// Check that every tool result answers an earlier tool invocation.
    pub fn validate(&self) -> Result<(), String> {
        let mut requested: HashSet<&str> = HashSet::new();
        for (index, message) in self.messages.iter().enumerate() {
            if let Some(call) = message.tool_invocation() {
                requested.insert(call.id.as_str());
            }
            if let Some(result) = message.tool_result_part() {
                if !requested.contains(result.tool_call_id.as_str()) {
                    return Err(format!(
                        "message {index}: tool result '{}' has no matching tool call",
                        result.tool_call_id
                    ));
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<ModelMessage>> for ConversationHistory {
    fn from(messages: Vec<ModelMessage>) -> Self {
        Self { messages }
    }
}

impl IntoIterator for ConversationHistory {
    type Item = ModelMessage;
    type IntoIter = std::vec::IntoIter<ModelMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}
