//! The bounded tool-calling loop for one conversational turn.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::BugwatchError;
use crate::provider::{ModelProvider, ProviderRequest};
use crate::tools::{ToolExecutor, ToolSpec};
use crate::types::{ConversationHistory, ModelMessage};

use super::accumulator::{AccumulatedResponse, StreamAccumulator};
use super::events::{TurnEventEmitter, TurnEventPayload, TurnEventSink};
use super::types::{TurnOutcome, TurnStop};

/// Orchestrates model calls, tool execution and history updates for a turn.
///
/// The loop owns nothing between turns: history goes in by value and comes
/// back inside [`TurnOutcome`]. Dropping a `run_turn` future mid-flight
/// therefore discards the partial turn.
#[derive(Clone)]
pub struct AgentLoop {
    provider: Arc<dyn ModelProvider>,
    executor: ToolExecutor,
    event_sink: Option<TurnEventSink>,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn ModelProvider>, executor: ToolExecutor) -> Self {
        Self {
            provider,
            executor,
            event_sink: None,
        }
    }

    pub fn with_event_sink(mut self, sink: TurnEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Run one turn: append the user message, then alternate model calls and
    /// tool executions until the model answers without a tool call or
    /// `max_iterations` model calls have been made.
    ///
    /// Tool faults are folded into the history. Model faults abort the turn
    /// with `Err`.
    pub async fn run_turn(
        &self,
        mut history: ConversationHistory,
        user_text: impl Into<String>,
        max_iterations: u32,
    ) -> Result<TurnOutcome, BugwatchError> {
        let emitter = TurnEventEmitter::new(Uuid::new_v4(), self.event_sink.clone());
        emitter.emit(TurnEventPayload::TurnStarted);

        history.push(ModelMessage::user(user_text));
        let specs = self.executor.registry().list_specs();

        let mut iterations = 0;
        let mut answer = None;
        let mut stop = TurnStop::BudgetExhausted;

        while iterations < max_iterations {
            iterations += 1;
            emitter.emit(TurnEventPayload::IterationStarted {
                iteration: iterations,
            });

            let response = match self.stream_response(&history, &specs, &emitter).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(iteration = iterations, error = %err, "model invocation failed");
                    emitter.emit(TurnEventPayload::TurnFailed {
                        error: err.to_string(),
                    });
                    return Err(err);
                }
            };

            debug!(
                iteration = iterations,
                answer_len = response.answer.as_ref().map_or(0, String::len),
                tool_call = response.invocation.as_ref().map(|c| c.name.as_str()),
                finish_reason = ?response.finish_reason,
                "model response assembled"
            );

            if response.ignored_calls > 0 {
                warn!(
                    ignored = response.ignored_calls,
                    "model requested several tools; only the first is executed"
                );
                emitter.emit(TurnEventPayload::ExtraToolCallsIgnored {
                    count: response.ignored_calls,
                });
            }

            let Some(invocation) = response.invocation else {
                if let Some(text) = response.answer {
                    history.push(ModelMessage::assistant(text.clone()));
                    answer = Some(text);
                }
                stop = TurnStop::Answered;
                break;
            };

            emitter.emit(TurnEventPayload::ToolCallRequested {
                invocation: invocation.clone(),
            });
            history.push(ModelMessage::tool_call(invocation.clone()));

            let result = self
                .executor
                .execute(&invocation.name, &invocation.arguments)
                .await;
            emitter.emit(TurnEventPayload::ToolResult {
                tool_call_id: invocation.id.clone(),
                tool_name: invocation.name.clone(),
                result: result.clone(),
            });
            history.push(ModelMessage::tool_result(&invocation, result));

            if let Some(text) = response.answer {
                history.push(ModelMessage::assistant(text.clone()));
                answer = Some(text);
            }
        }

        info!(iterations, stop = ?stop, messages = history.len(), "turn complete");
        emitter.emit(TurnEventPayload::TurnCompleted { stop, iterations });

        Ok(TurnOutcome {
            history,
            iterations,
            answer,
            stop,
        })
    }

    async fn stream_response(
        &self,
        history: &ConversationHistory,
        specs: &[ToolSpec],
        emitter: &TurnEventEmitter,
    ) -> Result<AccumulatedResponse, BugwatchError> {
        let request = ProviderRequest {
            messages: history.messages().to_vec(),
            tools: specs.to_vec(),
        };
        let mut stream = self.provider.stream_chat(&request).await?;

        let mut accumulator = StreamAccumulator::new();
        while let Some(fragment) = stream.next().await {
            if let Some(text) = accumulator.push(fragment?) {
                emitter.emit(TurnEventPayload::AnswerDelta { text });
            }
        }
        Ok(accumulator.finish())
    }
}

impl std::fmt::Debug for AgentLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentLoop")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .field("executor", &self.executor)
            .finish()
    }
}
