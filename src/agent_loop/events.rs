//! Turn event stream types.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{FunctionResult, ToolInvocation};

use super::types::{TurnId, TurnStop};

/// Callback used for streaming turn events.
pub type TurnEventSink = Arc<dyn Fn(TurnEvent) + Send + Sync>;

/// Concrete event payloads emitted by the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEventPayload {
    TurnStarted,
    IterationStarted {
        iteration: u32,
    },
    AnswerDelta {
        text: String,
    },
    ToolCallRequested {
        invocation: ToolInvocation,
    },
    ExtraToolCallsIgnored {
        count: usize,
    },
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        result: FunctionResult,
    },
    TurnCompleted {
        stop: TurnStop,
        iterations: u32,
    },
    TurnFailed {
        error: String,
    },
}

/// Envelope for streaming turn events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnEvent {
    pub turn_id: TurnId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: TurnEventPayload,
}

pub(crate) struct TurnEventEmitter {
    turn_id: TurnId,
    seq: AtomicU64,
    sink: Option<TurnEventSink>,
}

impl TurnEventEmitter {
    pub(crate) fn new(turn_id: TurnId, sink: Option<TurnEventSink>) -> Self {
        Self {
            turn_id,
            seq: AtomicU64::new(1),
            sink,
        }
    }

    pub(crate) fn emit(&self, payload: TurnEventPayload) {
        let Some(sink) = &self.sink else {
            return;
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        (sink)(TurnEvent {
            turn_id: self.turn_id,
            seq,
            timestamp: Utc::now(),
            payload,
        });
    }
}
