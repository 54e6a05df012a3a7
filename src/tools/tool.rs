//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::arguments::ToolArguments;
use super::spec::{ToolName, ToolSpec};
use crate::error::BugwatchError;

/// A capability the model can call by name.
///
/// Implementations receive arguments that already passed schema validation
/// and return the opaque text handed back to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declared schema, advertised to the model on every request.
    fn spec(&self) -> &ToolSpec;

    fn name(&self) -> ToolName {
        self.spec().name
    }

    /// Run the capability.
    async fn invoke(&self, args: &ToolArguments) -> Result<String, BugwatchError>;
}

/// Typed argument record of a [`TypedTool`].
pub trait ToolInput: DeserializeOwned + Send {
    /// Checks the schema cannot express, e.g. date formats or ranges.
    fn validate(&self) -> Result<(), BugwatchError> {
        Ok(())
    }
}

/// A tool whose arguments deserialize into a typed record before it runs.
#[async_trait]
pub trait TypedTool: Send + Sync {
    type Input: ToolInput;

    fn tool_spec(&self) -> &ToolSpec;

    async fn call(&self, input: Self::Input) -> Result<String, BugwatchError>;
}

#[async_trait]
impl<T: TypedTool> Tool for T {
    fn spec(&self) -> &ToolSpec {
        self.tool_spec()
    }

    async fn invoke(&self, args: &ToolArguments) -> Result<String, BugwatchError> {
        let input: T::Input = args.deserialize()?;
        input.validate()?;
        self.call(input).await
    }
}

type ToolHandler = dyn Fn(ToolArguments) -> Pin<Box<dyn Future<Output = Result<String, BugwatchError>> + Send>>
    + Send
    + Sync;

/// Closure-based tool, useful for wiring custom capabilities and for tests.
pub struct AgentTool {
    spec: ToolSpec,
    handler: Arc<ToolHandler>,
}

impl AgentTool {
    /// Create a tool from a spec and an async closure.
    pub fn new<F, Fut>(spec: ToolSpec, handler: F) -> Self
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, BugwatchError>> + Send + 'static,
    {
        Self {
            spec,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &ToolArguments) -> Result<String, BugwatchError> {
        (self.handler)(args.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.spec.name)
            .field("description", &self.spec.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn agent_tool_runs_handler() {
        let tool = AgentTool::new(
            ToolSpec::builder(ToolName::BugsByKeyword, "Find bugs")
                .string("keyword", "Keyword", Some(50), true)
                .build(),
            |args| async move { Ok(format!("bugs for {}", args.get_str("keyword")?)) },
        );

        assert_eq!(tool.name(), ToolName::BugsByKeyword);
        let args = ToolArguments::new(serde_json::json!({ "keyword": "leak" }));
        assert_eq!(tool.invoke(&args).await.unwrap(), "bugs for leak");
    }
}
