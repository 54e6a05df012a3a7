//! Typed access to tool call arguments.

use crate::error::BugwatchError;

/// Parsed tool call arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Parse the raw payload accumulated from the model stream.
    ///
    /// An empty payload means "no arguments" and parses as `{}`.
    pub fn parse(raw: &str) -> Result<Self, BugwatchError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::new(serde_json::json!({})));
        }
        serde_json::from_str(trimmed)
            .map(Self::new)
            .map_err(|e| BugwatchError::InvalidArgument(format!("Malformed arguments: {e}")))
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, BugwatchError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| BugwatchError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get an integer argument.
    pub fn get_i64(&self, key: &str) -> Result<i64, BugwatchError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| BugwatchError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    /// Deserialize the entire arguments into a typed record.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, BugwatchError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            BugwatchError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
