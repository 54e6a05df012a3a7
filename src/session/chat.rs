//! A chat session: the history that outlives single turns.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent_loop::{AgentLoop, TurnOutcome};
use crate::error::BugwatchError;
use crate::types::ConversationHistory;

use super::store::SessionStore;

/// Owns the conversation history between turns and runs turns one at a
/// time. A failed turn leaves the history exactly as it was.
pub struct ChatSession {
    id: String,
    agent: AgentLoop,
    system_prompt: String,
    max_iterations: u32,
    history: ConversationHistory,
    store: Option<Arc<dyn SessionStore>>,
}

impl ChatSession {
    pub fn new(
        id: impl Into<String>,
        agent: AgentLoop,
        system_prompt: impl Into<String>,
        max_iterations: u32,
    ) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            id: id.into(),
            agent,
            history: ConversationHistory::with_system_prompt(system_prompt.clone()),
            system_prompt,
            max_iterations,
            store: None,
        }
    }

    /// Attach a store and resume any history already saved under this id.
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Result<Self, BugwatchError> {
        if let Some(history) = store.load(&self.id)? {
            debug!(session = %self.id, messages = history.len(), "resumed session");
            self.history = history;
        }
        self.store = Some(store);
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Run one turn. The updated history is committed (and persisted) only
    /// when the turn succeeds.
    pub async fn send(&mut self, text: impl Into<String>) -> Result<TurnOutcome, BugwatchError> {
        let outcome = self
            .agent
            .run_turn(self.history.clone(), text, self.max_iterations)
            .await?;

        self.history = outcome.history.clone();
        if let Some(store) = &self.store {
            if let Err(err) = store.save(&self.id, &self.history) {
                warn!(session = %self.id, error = %err, "failed to persist session");
                return Err(err);
            }
        }
        Ok(outcome)
    }

    /// Drop the conversation and start over from the system prompt.
    pub fn reset(&mut self) -> Result<(), BugwatchError> {
        self.history = ConversationHistory::with_system_prompt(self.system_prompt.clone());
        if let Some(store) = &self.store {
            store.clear(&self.id)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("max_iterations", &self.max_iterations)
            .field("messages", &self.history.len())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}
