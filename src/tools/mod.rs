//! Tool system for function calling.

pub mod arguments;
pub mod catalog;
pub mod executor;
pub mod registry;
pub mod spec;
pub mod tool;
pub mod validation;

pub use arguments::ToolArguments;
pub use executor::ToolExecutor;
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use spec::{ParameterKind, ParameterSpec, ToolName, ToolSpec};
pub use tool::{AgentTool, Tool, ToolInput, TypedTool};
pub use crate::types::FunctionResult;
