//! Message types for model communication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ModelMessage {
    fn with_parts(role: Role, content: Vec<ContentPart>) -> Self {
        Self {
            role,
            content,
            timestamp: Some(Utc::now()),
        }
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::with_parts(Role::System, vec![ContentPart::Text { text: text.into() }])
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_parts(Role::User, vec![ContentPart::Text { text: text.into() }])
    }

    /// Create an assistant message carrying answer text.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_parts(
            Role::Assistant,
            vec![ContentPart::Text { text: text.into() }],
        )
    }

    /// Create an assistant message that only requests a tool.
    pub fn tool_call(invocation: ToolInvocation) -> Self {
        Self::with_parts(Role::Assistant, vec![ContentPart::ToolCall(invocation)])
    }

    /// Create a tool result message correlated with `invocation`.
    pub fn tool_result(invocation: &ToolInvocation, result: FunctionResult) -> Self {
        Self::with_parts(
            Role::Tool,
            vec![ContentPart::ToolResult(ToolResultPart {
                tool_call_id: invocation.id.clone(),
                tool_name: invocation.name.clone(),
                result,
            })],
        )
    }

    /// Extract the text content, concatenating all text parts.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// The tool invocation requested by this message, if any.
    pub fn tool_invocation(&self) -> Option<&ToolInvocation> {
        self.content.iter().find_map(|part| match part {
            ContentPart::ToolCall(call) => Some(call),
            _ => None,
        })
    }

    /// The tool result carried by this message, if any.
    pub fn tool_result_part(&self) -> Option<&ToolResultPart> {
        self.content.iter().find_map(|part| match part {
            ContentPart::ToolResult(result) => Some(result),
            _ => None,
        })
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single part of message content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ToolCall(ToolInvocation),
    ToolResult(ToolResultPart),
}

/// A tool call requested by the model.
///
/// `arguments` is the raw payload exactly as the model streamed it; it is
/// only parsed by the tool executor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// The outcome of a tool call, folded back into the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResultPart {
    pub tool_call_id: String,
    pub tool_name: String,
    pub result: FunctionResult,
}

/// Normalized tool outcome. Tool faults never escape the executor; they end
/// up here as `Error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FunctionResult {
    Success { output: String },
    Error { message: String },
}

impl FunctionResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self::Success {
            output: output.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Text handed to the model as the tool message content.
    pub fn to_model_content(&self) -> String {
        match self {
            Self::Success { output } => output.clone(),
            Self::Error { message } => serde_json::json!({ "error": message }).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> ToolInvocation {
        ToolInvocation {
            id: "call_1".to_string(),
            name: "get_bugs_by_keyword".to_string(),
            arguments: r#"{"keyword":"memory leak"}"#.to_string(),
        }
    }

    #[test]
    fn tool_call_message_has_no_text() {
        let msg = ModelMessage::tool_call(invocation());
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.text(), "");
        assert_eq!(msg.tool_invocation().map(|c| c.id.as_str()), Some("call_1"));
    }

    #[test]
    fn tool_result_carries_name_and_correlation_id() {
        let msg = ModelMessage::tool_result(&invocation(), FunctionResult::success("[]"));
        let part = msg.tool_result_part().unwrap();
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(part.tool_call_id, "call_1");
        assert_eq!(part.tool_name, "get_bugs_by_keyword");
    }

    #[test]
    fn error_result_renders_as_json_for_the_model() {
        let result = FunctionResult::error("boom");
        assert!(result.is_error());
        assert_eq!(result.to_model_content(), r#"{"error":"boom"}"#);
        assert_eq!(FunctionResult::success("ok").to_model_content(), "ok");
    }

    #[test]
    fn message_serde_uses_tagged_parts() {
        let msg = ModelMessage::tool_result(&invocation(), FunctionResult::error("bad"));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["content"][0]["type"], "tool_result");
        assert_eq!(json["content"][0]["result"]["status"], "error");
        let back: ModelMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
