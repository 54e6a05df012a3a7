//! End-to-end behavior of the bounded tool-calling loop.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use bugwatch::agent_loop::{TurnEventPayload, TurnStop};
use bugwatch::error::BugwatchError;
use bugwatch::session::ChatSession;
use bugwatch::tools::catalog;
use bugwatch::types::{ConversationHistory, FunctionResult, Role, StreamFragment};

use common::{
    answer, collecting_sink, scripted_agent, tool_call, tool_call_fragments, Script,
    ScriptedProvider,
};

fn tool_result_of(history: &ConversationHistory, index: usize) -> FunctionResult {
    history.messages()[index]
        .tool_result_part()
        .map(|part| part.result.clone())
        .unwrap()
}

#[tokio::test]
async fn bug_lookup_then_answer() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_call("call_1", "get_bugs_by_keyword", r#"{"keyword":"memory leak"}"#),
        answer("CSCwa12345 describes a memory leak in the wireless controller."),
    ]));
    let (agent, calls) = scripted_agent(provider.clone());

    let outcome = agent
        .run_turn(
            ConversationHistory::with_system_prompt("be helpful"),
            "Any memory leak bugs?",
            2,
        )
        .await
        .unwrap();

    assert_eq!(outcome.stop, TurnStop::Answered);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(
        outcome.answer.as_deref(),
        Some("CSCwa12345 describes a memory leak in the wireless controller.")
    );
    assert_eq!(
        outcome.history.roles(),
        vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );
    assert!(outcome.history.validate().is_ok());

    let invocation = outcome.history.messages()[2].tool_invocation().unwrap();
    assert_eq!(invocation.id, "call_1");
    assert_eq!(invocation.name, "get_bugs_by_keyword");
    assert_eq!(invocation.arguments, r#"{"keyword":"memory leak"}"#);

    let FunctionResult::Success { output } = tool_result_of(&outcome.history, 3) else {
        panic!("expected a successful tool result");
    };
    assert!(output.contains("CSCwa12345"));

    assert_eq!(
        calls.lock().unwrap().clone(),
        vec![(
            "get_bugs_by_keyword".to_string(),
            json!({ "keyword": "memory leak" })
        )]
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].messages.len(), 2);
    assert_eq!(requests[1].messages.len(), 4);
    for request in &requests {
        assert_eq!(request.tools, catalog::specs());
    }
}

#[tokio::test]
async fn oversized_keyword_becomes_error_result() {
    let keyword = "k".repeat(51);
    let arguments = json!({ "keyword": keyword }).to_string();
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_call("call_long", "get_bugs_by_keyword", &arguments),
        answer("Please use a shorter keyword."),
    ]));
    let (agent, calls) = scripted_agent(provider.clone());

    let outcome = agent
        .run_turn(ConversationHistory::new(), "search", 2)
        .await
        .unwrap();

    assert!(calls.lock().unwrap().is_empty());
    let FunctionResult::Error { message } = tool_result_of(&outcome.history, 2) else {
        panic!("expected an error tool result");
    };
    assert!(message.contains("at most 50 characters"), "{message}");

    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.stop, TurnStop::Answered);
    assert_eq!(outcome.answer.as_deref(), Some("Please use a shorter keyword."));
}

#[tokio::test]
async fn budget_of_one_executes_tool_without_answer() {
    let provider = Arc::new(ScriptedProvider::repeating(|| {
        tool_call(
            "call_adv",
            "get_security_advisories",
            r#"{"start_date":"2024-01-01","end_date":"2024-01-31","page_index":1}"#,
        )
    }));
    let (agent, calls) = scripted_agent(provider.clone());

    let outcome = agent
        .run_turn(ConversationHistory::new(), "January advisories", 1)
        .await
        .unwrap();

    assert_eq!(outcome.stop, TurnStop::BudgetExhausted);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.answer, None);
    assert_eq!(
        outcome.history.roles(),
        vec![Role::User, Role::Assistant, Role::Tool]
    );
    assert!(!tool_result_of(&outcome.history, 2).is_error());
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn model_calls_never_exceed_budget() {
    let provider = Arc::new(ScriptedProvider::repeating(|| {
        tool_call("call_loop", "get_bugs_by_keyword", r#"{"keyword":"crash"}"#)
    }));
    let (agent, calls) = scripted_agent(provider.clone());

    let outcome = agent
        .run_turn(ConversationHistory::new(), "keep going", 3)
        .await
        .unwrap();

    assert_eq!(provider.calls(), 3);
    assert_eq!(calls.lock().unwrap().len(), 3);
    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.stop, TurnStop::BudgetExhausted);
    assert!(outcome.history.validate().is_ok());
}

#[tokio::test]
async fn zero_budget_only_records_user_message() {
    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let (agent, _) = scripted_agent(provider.clone());

    let outcome = agent
        .run_turn(ConversationHistory::new(), "hello", 0)
        .await
        .unwrap();

    assert_eq!(provider.calls(), 0);
    assert_eq!(outcome.iterations, 0);
    assert_eq!(outcome.stop, TurnStop::BudgetExhausted);
    assert_eq!(outcome.history.roles(), vec![Role::User]);
}

#[tokio::test]
async fn refused_request_aborts_turn() {
    let provider = Arc::new(ScriptedProvider::new(vec![Script::Refuse(
        BugwatchError::Authentication("invalid api key".into()),
    )]));
    let (agent, sink_events) = {
        let (agent, _) = scripted_agent(provider.clone());
        let (sink, events) = collecting_sink();
        (agent.with_event_sink(sink), events)
    };

    let err = agent
        .run_turn(ConversationHistory::new(), "hello", 2)
        .await
        .unwrap_err();

    assert!(matches!(err, BugwatchError::Authentication(_)));
    let events = sink_events.lock().unwrap();
    assert!(matches!(
        events.last().map(|e| &e.payload),
        Some(TurnEventPayload::TurnFailed { .. })
    ));
}

#[tokio::test]
async fn mid_stream_fault_aborts_after_tool_round() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_call("call_1", "get_bugs_by_keyword", r#"{"keyword":"vpn"}"#),
        Script::Fragments(vec![
            Ok(StreamFragment::text("Partial ")),
            Err(BugwatchError::Stream("connection reset".into())),
        ]),
    ]));
    let (agent, calls) = scripted_agent(provider.clone());

    let err = agent
        .run_turn(ConversationHistory::new(), "vpn bugs", 2)
        .await
        .unwrap_err();

    assert!(matches!(err, BugwatchError::Stream(ref m) if m == "connection reset"));
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn observer_sees_deltas_in_order() {
    let provider = Arc::new(ScriptedProvider::new(vec![answer(
        "No advisories were published that week.",
    )]));
    let (sink, events) = collecting_sink();
    let (agent, _) = scripted_agent(provider);
    let agent = agent.with_event_sink(sink);

    let outcome = agent
        .run_turn(ConversationHistory::new(), "advisories last week?", 2)
        .await
        .unwrap();

    let events = events.lock().unwrap();
    let streamed: String = events
        .iter()
        .filter_map(|e| match &e.payload {
            TurnEventPayload::AnswerDelta { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(Some(streamed), outcome.answer);

    assert!(matches!(events[0].payload, TurnEventPayload::TurnStarted));
    assert!(matches!(
        events.last().map(|e| &e.payload),
        Some(TurnEventPayload::TurnCompleted {
            stop: TurnStop::Answered,
            iterations: 1
        })
    ));
    let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    assert!(events.iter().all(|e| e.turn_id == events[0].turn_id));
}

#[tokio::test]
async fn unknown_tool_is_reported_to_model() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_call("call_w", "lookup_weather", r#"{"city":"Oslo"}"#),
        answer("I can only look up advisories and bugs."),
    ]));
    let (agent, calls) = scripted_agent(provider.clone());

    let outcome = agent
        .run_turn(ConversationHistory::new(), "weather?", 2)
        .await
        .unwrap();

    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(
        tool_result_of(&outcome.history, 2),
        FunctionResult::error("Tool 'lookup_weather' is not available")
    );
    assert_eq!(outcome.stop, TurnStop::Answered);
}

#[tokio::test]
async fn malformed_arguments_do_not_abort_turn() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_call("call_bad", "get_bugs_by_keyword", r#"{"keyword": "leak"#),
        answer("Something went wrong with that lookup."),
    ]));
    let (agent, calls) = scripted_agent(provider.clone());

    let outcome = agent
        .run_turn(ConversationHistory::new(), "leaks", 2)
        .await
        .unwrap();

    assert!(calls.lock().unwrap().is_empty());
    assert!(tool_result_of(&outcome.history, 2).is_error());
    assert_eq!(outcome.iterations, 2);
}

#[tokio::test]
async fn only_first_tool_call_is_executed() {
    let mut fragments = tool_call_fragments(0, "call_a", "get_bugs_by_keyword", r#"{"keyword":"bgp"}"#);
    fragments.pop();
    fragments.extend(tool_call_fragments(
        1,
        "call_b",
        "get_security_advisories",
        r#"{"start_date":"2024-01-01","end_date":"2024-01-02","page_index":1}"#,
    ));
    let provider = Arc::new(ScriptedProvider::new(vec![
        Script::Fragments(fragments),
        answer("Found one BGP bug."),
    ]));
    let (sink, events) = collecting_sink();
    let (agent, calls) = scripted_agent(provider);
    let agent = agent.with_event_sink(sink);

    let outcome = agent
        .run_turn(ConversationHistory::new(), "bgp", 2)
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "get_bugs_by_keyword");
    assert_eq!(
        outcome.history.messages()[1].tool_invocation().map(|c| c.id.as_str()),
        Some("call_a")
    );
    assert!(events.lock().unwrap().iter().any(|e| matches!(
        e.payload,
        TurnEventPayload::ExtraToolCallsIgnored { count: 1 }
    )));
}

#[tokio::test]
async fn failed_turn_leaves_session_history_untouched() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        answer("Hello."),
        tool_call("call_1", "get_bugs_by_keyword", r#"{"keyword":"ospf"}"#),
        Script::Refuse(BugwatchError::RateLimited {
            retry_after_ms: Some(1000),
        }),
    ]));
    let (agent, _) = scripted_agent(provider);
    let mut session = ChatSession::new("s1", agent, "be helpful", 2);

    session.send("hi").await.unwrap();
    let before = session.history().clone();
    assert_eq!(before.roles(), vec![Role::System, Role::User, Role::Assistant]);

    let err = session.send("ospf bugs").await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(session.history(), &before);
}
