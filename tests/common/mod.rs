//! Shared test helpers and a scripted model provider.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use bugwatch::agent_loop::{AgentLoop, TurnEvent, TurnEventSink};
use bugwatch::error::BugwatchError;
use bugwatch::provider::{FragmentStream, ModelProvider, ProviderRequest};
use bugwatch::tools::catalog::{advisories, bugs};
use bugwatch::tools::{AgentTool, ToolExecutor, ToolRegistry};
use bugwatch::types::{FinishReason, StreamFragment};

/// One canned model response.
pub enum Script {
    /// Fragments yielded in order; an `Err` item is a mid-stream fault.
    Fragments(Vec<Result<StreamFragment, BugwatchError>>),
    /// The request fails before any fragment arrives.
    Refuse(BugwatchError),
}

/// A provider that replays scripted responses and records every request.
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    repeat: Option<fn() -> Script>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers every request with a fresh `make()` script.
    pub fn repeating(make: fn() -> Script) -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            repeat: Some(make),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn stream_chat(&self, request: &ProviderRequest) -> Result<FragmentStream, BugwatchError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.scripts.lock().unwrap().pop_front();
        let script = match (next, self.repeat) {
            (Some(script), _) => script,
            (None, Some(make)) => make(),
            (None, None) => {
                return Err(BugwatchError::Stream("no scripted response left".into()));
            }
        };
        match script {
            Script::Fragments(items) => Ok(Box::pin(futures::stream::iter(items))),
            Script::Refuse(err) => Err(err),
        }
    }
}

/// An answer streamed word by word.
pub fn answer(text: &str) -> Script {
    let mut items: Vec<Result<StreamFragment, BugwatchError>> = text
        .split_inclusive(' ')
        .map(|word| Ok(StreamFragment::text(word)))
        .collect();
    items.push(Ok(StreamFragment::finish(FinishReason::Stop)));
    Script::Fragments(items)
}

/// A single tool call whose arguments arrive in three-character chunks.
pub fn tool_call(id: &str, name: &str, arguments: &str) -> Script {
    Script::Fragments(tool_call_fragments(0, id, name, arguments))
}

pub fn tool_call_fragments(
    index: u32,
    id: &str,
    name: &str,
    arguments: &str,
) -> Vec<Result<StreamFragment, BugwatchError>> {
    let mut items = vec![Ok(StreamFragment::tool_name(index, id, name))];
    let chars: Vec<char> = arguments.chars().collect();
    for chunk in chars.chunks(3) {
        items.push(Ok(StreamFragment::tool_arguments(
            index,
            chunk.iter().collect::<String>(),
        )));
    }
    items.push(Ok(StreamFragment::finish(FinishReason::ToolCalls)));
    items
}

/// Calls received by the fake catalog tools: `(tool name, raw arguments)`.
pub type CallLog = Arc<Mutex<Vec<(String, serde_json::Value)>>>;

/// A registry with the real catalog schemas backed by canned outputs.
pub fn fake_catalog() -> (ToolRegistry, CallLog) {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));

    let bug_log = log.clone();
    let bugs_tool = AgentTool::new(bugs::spec(), move |args| {
        let log = bug_log.clone();
        async move {
            log.lock()
                .unwrap()
                .push(("get_bugs_by_keyword".to_string(), args.raw().clone()));
            let keyword = args.get_str("keyword")?;
            Ok(format!(
                r#"{{"bugs":[{{"bug_id":"CSCwa12345","headline":"{keyword} in wireless controller"}}]}}"#
            ))
        }
    });

    let advisory_log = log.clone();
    let advisories_tool = AgentTool::new(advisories::spec(), move |args| {
        let log = advisory_log.clone();
        async move {
            log.lock()
                .unwrap()
                .push(("get_security_advisories".to_string(), args.raw().clone()));
            Ok(r#"{"advisories":[{"advisoryId":"cisco-sa-test"}]}"#.to_string())
        }
    });

    let registry = ToolRegistry::builder()
        .register(Arc::new(advisories_tool))
        .register(Arc::new(bugs_tool))
        .build();
    (registry, log)
}

/// An agent loop over `provider` and the fake catalog.
pub fn scripted_agent(provider: Arc<ScriptedProvider>) -> (AgentLoop, CallLog) {
    let (registry, log) = fake_catalog();
    let agent = AgentLoop::new(provider, ToolExecutor::new(Arc::new(registry)));
    (agent, log)
}

/// An event sink that collects everything it sees.
pub fn collecting_sink() -> (TurnEventSink, Arc<Mutex<Vec<TurnEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink_events = events.clone();
    let sink: TurnEventSink = Arc::new(move |event: TurnEvent| {
        sink_events.lock().unwrap().push(event);
    });
    (sink, events)
}
