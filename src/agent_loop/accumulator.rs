//! Reassembles one streamed model response into answer text and at most one
//! tool invocation.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::types::{FinishReason, StreamFragment, ToolCallDelta, ToolInvocation};

/// Where the accumulator is within the current response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    Idle,
    StreamingAnswer,
    BuildingToolCall,
}

#[derive(Debug, Clone, Default)]
struct CallBuffer {
    index: u32,
    id: Option<String>,
    name: String,
    arguments: String,
}

impl CallBuffer {
    fn owns(&self, delta: &ToolCallDelta) -> bool {
        if delta.index != self.index {
            return false;
        }
        match (&self.id, &delta.id) {
            (Some(known), Some(incoming)) => known == incoming,
            _ => true,
        }
    }
}

/// Final product of one model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatedResponse {
    /// Visible answer text, `None` when the model produced none.
    pub answer: Option<String>,
    /// The first tool call of the response, if it carried a name.
    pub invocation: Option<ToolInvocation>,
    /// Number of additional tool calls that were dropped.
    pub ignored_calls: usize,
    pub finish_reason: Option<FinishReason>,
}

/// Per-stream state machine. First tool call wins: fragments of any other
/// call are dropped and counted.
#[derive(Debug)]
pub struct StreamAccumulator {
    state: AccumulatorState,
    answer: String,
    call: Option<CallBuffer>,
    ignored: BTreeSet<u32>,
    ignored_fragments: usize,
    finish_reason: Option<FinishReason>,
}

impl Default for StreamAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self {
            state: AccumulatorState::Idle,
            answer: String::new(),
            call: None,
            ignored: BTreeSet::new(),
            ignored_fragments: 0,
            finish_reason: None,
        }
    }

    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    /// Raw argument payload gathered so far for the pending call.
    pub fn pending_arguments(&self) -> Option<&str> {
        self.call.as_ref().map(|c| c.arguments.as_str())
    }

    /// Fragments dropped because they belonged to a second tool call.
    pub fn ignored_fragments(&self) -> usize {
        self.ignored_fragments
    }

    /// Feed one fragment. Returns the visible text to deliver to the
    /// observer, if the fragment carried any.
    pub fn push(&mut self, fragment: StreamFragment) -> Option<String> {
        if let Some(reason) = fragment.finish_reason {
            self.finish_reason = Some(reason);
        }

        if let Some(delta) = fragment.tool_call {
            self.push_tool_delta(delta);
        }

        let text = fragment.text.filter(|t| !t.is_empty())?;
        self.answer.push_str(&text);
        if self.state == AccumulatorState::Idle {
            self.state = AccumulatorState::StreamingAnswer;
        }
        Some(text)
    }

    fn push_tool_delta(&mut self, delta: ToolCallDelta) {
        let call = self.call.get_or_insert_with(|| CallBuffer {
            index: delta.index,
            ..CallBuffer::default()
        });

        if !call.owns(&delta) {
            self.ignored.insert(delta.index);
            self.ignored_fragments += 1;
            return;
        }

        if call.id.is_none() {
            call.id = delta.id;
        }
        self.state = AccumulatorState::BuildingToolCall;

        if let Some(name) = delta.name {
            call.name.push_str(&name);
        } else if let Some(chunk) = delta.arguments {
            call.arguments.push_str(&chunk);
        }
    }

    /// Close the stream and hand back what was assembled.
    pub fn finish(self) -> AccumulatedResponse {
        let invocation = self
            .call
            .filter(|call| !call.name.is_empty())
            .map(|call| ToolInvocation {
                id: call
                    .id
                    .unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple())),
                name: call.name,
                arguments: call.arguments,
            });

        AccumulatedResponse {
            answer: (!self.answer.is_empty()).then_some(self.answer),
            invocation,
            ignored_calls: self.ignored.len(),
            finish_reason: self.finish_reason,
        }
    }
}
