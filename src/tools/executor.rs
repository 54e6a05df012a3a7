//! Runs tool invocations and normalizes every outcome into a
//! [`FunctionResult`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::registry::ToolRegistry;
use super::validation::validate_arguments;
use crate::types::FunctionResult;

/// Executes tool calls against a [`ToolRegistry`].
///
/// `execute` never fails: unknown tools, malformed or invalid arguments and
/// capability faults all come back as [`FunctionResult::Error`] so the
/// conversation can continue.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn execute(&self, name: &str, raw_arguments: &str) -> FunctionResult {
        let Some(tool) = self.registry.resolve(name) else {
            warn!(tool = name, "model requested an unknown tool");
            return FunctionResult::error(format!("Tool '{name}' is not available"));
        };

        let args = match ToolArguments::parse(raw_arguments) {
            Ok(args) => args,
            Err(err) => {
                debug!(tool = name, error = %err, "tool arguments did not parse");
                return FunctionResult::error(format!("Invalid arguments for '{name}': {err}"));
            }
        };

        if let Err(message) = validate_arguments(args.raw(), tool.spec()) {
            debug!(tool = name, %message, "tool arguments failed validation");
            return FunctionResult::error(format!("Invalid arguments for '{name}': {message}"));
        }

        match AssertUnwindSafe(tool.invoke(&args)).catch_unwind().await {
            Ok(Ok(output)) => {
                debug!(tool = name, bytes = output.len(), "tool call succeeded");
                FunctionResult::success(output)
            }
            Ok(Err(err)) => {
                warn!(
                    tool = name,
                    category = ?err.category(),
                    error = %err,
                    "tool call failed"
                );
                FunctionResult::error(err.to_string())
            }
            Err(_) => {
                warn!(tool = name, "tool call panicked");
                FunctionResult::error(format!("Tool '{name}' failed unexpectedly"))
            }
        }
    }
}
