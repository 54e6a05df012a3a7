//! CLI command handlers for ask, chat and tools.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use uuid::Uuid;

use crate::agent_loop::{AgentLoop, TurnStop};
use crate::api::{ApiClient, ClientCredentialsAuth};
use crate::config::BugwatchConfig;
use crate::error::BugwatchError;
use crate::provider::create_provider;
use crate::session::{ChatSession, FileSessionStore, STARTERS};
use crate::tools::{catalog, ToolExecutor};

use super::render::terminal_sink;
use super::Cli;

/// Load configuration and apply command-line overrides.
pub fn load_config(cli: &Cli) -> Result<BugwatchConfig, BugwatchError> {
    let mut config = BugwatchConfig::load(cli.config.as_deref())?;
    if let Some(max_iterations) = cli.max_iterations {
        config.agent.max_iterations = max_iterations;
    }
    if let Some(model) = &cli.model {
        config.model.model = model.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Wire provider, API client, registry and executor into an agent loop.
pub fn build_agent(config: &BugwatchConfig) -> Result<AgentLoop, BugwatchError> {
    let provider = create_provider(&config.model)?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.api.request_timeout_secs))
        .build()?;
    let (client_id, client_secret) = config.api.credentials()?;
    let auth = ClientCredentialsAuth::new(&config.api.token_url, client_id, client_secret)
        .with_client(http.clone());
    let client = ApiClient::new(&config.api.base_url, Arc::new(auth))?.with_http_client(http);

    let registry = catalog::default_registry(Arc::new(client), config.api.advisory_page_size);
    debug!(
        provider = provider.provider_name(),
        model = provider.model_id(),
        tools = registry.len(),
        "agent wired"
    );
    Ok(AgentLoop::new(provider, ToolExecutor::new(Arc::new(registry))).with_event_sink(terminal_sink()))
}

/// `bugwatch ask <prompt>`
pub async fn handle_ask(config: &BugwatchConfig, prompt: String) -> Result<(), BugwatchError> {
    let agent = build_agent(config)?;
    let mut session = ChatSession::new(
        Uuid::new_v4().to_string(),
        agent,
        &config.agent.system_prompt,
        config.agent.max_iterations,
    );
    let outcome = session.send(prompt).await?;
    println!();
    if outcome.stop == TurnStop::BudgetExhausted && outcome.answer.is_none() {
        eprintln!(
            "(stopped after {} model call(s) without a final answer)",
            outcome.iterations
        );
    }
    Ok(())
}

/// `bugwatch chat [--session <id>]`
pub async fn handle_chat(
    config: &BugwatchConfig,
    session_id: Option<String>,
) -> Result<(), BugwatchError> {
    let agent = build_agent(config)?;
    let id = session_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut session = ChatSession::new(
        id,
        agent,
        &config.agent.system_prompt,
        config.agent.max_iterations,
    );
    if session_id.is_some() {
        session = session.with_store(Arc::new(FileSessionStore::new_default()))?;
    }

    eprintln!("Ask about security advisories or bugs. /reset clears the conversation, /quit exits.");
    for (i, starter) in STARTERS.iter().enumerate() {
        eprintln!("  [{}] {}", i + 1, starter.label);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        let prompt = match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset()?;
                eprintln!("(conversation cleared)");
                continue;
            }
            other => match other.parse::<usize>() {
                Ok(n) if (1..=STARTERS.len()).contains(&n) => STARTERS[n - 1].message.to_string(),
                _ => other.to_string(),
            },
        };

        match session.send(prompt).await {
            Ok(_) => println!(),
            Err(err) => eprintln!("\nError: {err}"),
        }
    }
    Ok(())
}

/// `bugwatch tools`
pub fn handle_tools() -> Result<(), BugwatchError> {
    let specs: Vec<serde_json::Value> = catalog::specs().iter().map(|s| s.to_json()).collect();
    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(())
}
