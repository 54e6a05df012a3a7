//! bugwatch: a streaming tool-calling chat agent for security advisories
//! and defect records.
//!
//! The model streams its answer; when it asks for a tool, the call is
//! reassembled from fragments, executed against the advisory/defect APIs,
//! folded back into the conversation and the model is asked again, up to a
//! bounded number of iterations per turn.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use bugwatch::prelude::*;
//!
//! # async fn example() -> bugwatch::error::Result<()> {
//! let config = BugwatchConfig::from_env()?;
//! let provider = bugwatch::provider::create_provider(&config.model)?;
//! let (id, secret) = config.api.credentials()?;
//! let auth = ClientCredentialsAuth::new(&config.api.token_url, id, secret);
//! let client = Arc::new(ApiClient::new(&config.api.base_url, Arc::new(auth))?);
//! let registry = bugwatch::tools::catalog::default_registry(client, 5);
//!
//! let agent = AgentLoop::new(provider, ToolExecutor::new(Arc::new(registry)));
//! let outcome = agent
//!     .run_turn(ConversationHistory::new(), "Cisco Catalyst 9800 bugs", 2)
//!     .await?;
//! println!("{:?}", outcome.answer);
//! # Ok(())
//! # }
//! ```

pub mod agent_loop;
pub mod api;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
