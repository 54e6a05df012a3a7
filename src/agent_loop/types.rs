//! Core turn types for the agent loop.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ConversationHistory;

/// Unique turn identifier.
pub type TurnId = Uuid;

/// Why a turn stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnStop {
    /// The model answered without requesting a tool.
    Answered,
    /// Every iteration requested a tool; the budget ran out.
    BudgetExhausted,
}

/// Result of a completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// History with the user message and everything the turn produced.
    pub history: ConversationHistory,
    /// Number of model invocations performed.
    pub iterations: u32,
    /// Last visible answer text produced during the turn.
    pub answer: Option<String>,
    pub stop: TurnStop,
}
