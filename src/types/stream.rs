//! Streaming types.

use serde::{Deserialize, Serialize};

/// One incremental unit of a streamed model response.
///
/// A fragment may carry visible answer text, a piece of a tool call, or
/// both. Fragment order is significant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreamFragment {
    /// Visible answer text (possibly empty).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Tool call piece.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCallDelta>,
    /// Finish reason (only on the final fragment).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl StreamFragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// A fragment opening a tool call: correlation id plus name chunk.
    pub fn tool_name(index: u32, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tool_call: Some(ToolCallDelta {
                index,
                id: Some(id.into()),
                name: Some(name.into()),
                arguments: None,
            }),
            ..Default::default()
        }
    }

    /// A fragment continuing a tool call's argument payload.
    pub fn tool_arguments(index: u32, chunk: impl Into<String>) -> Self {
        Self {
            tool_call: Some(ToolCallDelta {
                index,
                id: None,
                name: None,
                arguments: Some(chunk.into()),
            }),
            ..Default::default()
        }
    }

    pub fn finish(reason: FinishReason) -> Self {
        Self {
            finish_reason: Some(reason),
            ..Default::default()
        }
    }
}

/// A piece of a streamed tool call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallDelta {
    /// Position of the call within the response; pieces of one call share it.
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}

impl FinishReason {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stop" => Some(Self::Stop),
            "length" => Some(Self::Length),
            "tool_calls" | "function_call" => Some(Self::ToolCalls),
            "content_filter" => Some(Self::ContentFilter),
            _ => None,
        }
    }
}
