//! Convenience re-exports for common use.

pub use crate::agent_loop::{AgentLoop, TurnEvent, TurnEventPayload, TurnEventSink, TurnOutcome, TurnStop};
pub use crate::api::{ApiClient, ClientCredentialsAuth, StaticToken, TokenProvider};
pub use crate::config::BugwatchConfig;
pub use crate::error::{BugwatchError, Result};
pub use crate::provider::{ModelProvider, ProviderRequest};
pub use crate::session::{ChatSession, SessionStore};
pub use crate::tools::{AgentTool, Tool, ToolArguments, ToolExecutor, ToolName, ToolRegistry, ToolSpec};
pub use crate::types::{ConversationHistory, FunctionResult, ModelMessage, Role, StreamFragment};
