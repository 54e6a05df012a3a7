//! Terminal rendering of turn events: answer text to stdout, tool activity
//! to stderr.

use std::io::Write;
use std::sync::Arc;

use crate::agent_loop::{TurnEvent, TurnEventPayload, TurnEventSink};
use crate::types::FunctionResult;

const PREVIEW_CHARS: usize = 200;

/// Event sink that streams the turn to the terminal.
pub fn terminal_sink() -> TurnEventSink {
    Arc::new(|event: TurnEvent| match &event.payload {
        TurnEventPayload::AnswerDelta { text } => {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
        TurnEventPayload::ToolCallRequested { invocation } => {
            eprintln!("\n⚡ {} {}", invocation.name, invocation.arguments);
        }
        TurnEventPayload::ToolResult { result, .. } => match result {
            FunctionResult::Success { output } => eprintln!("  ✅ {}", preview(output)),
            FunctionResult::Error { message } => eprintln!("  ❌ {}", preview(message)),
        },
        TurnEventPayload::ExtraToolCallsIgnored { count } => {
            eprintln!("  ⚠ ignored {count} additional tool call(s)");
        }
        _ => {}
    })
}

/// First `PREVIEW_CHARS` characters, with an ellipsis when cut.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
