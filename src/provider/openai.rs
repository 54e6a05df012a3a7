//! OpenAI Chat Completions API provider (streaming, function calling).

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::BugwatchError;
use crate::types::*;

use super::http::{error_for_response, parse_sse_data, shared_client, Credential};
use super::retry::RetryPolicy;
use super::{FragmentStream, ModelProvider, ProviderRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat Completions client. Azure reuses it with a different endpoint and
/// auth header.
pub struct OpenAiProvider {
    provider_name: &'static str,
    model: String,
    endpoint: String,
    headers: HeaderMap,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenAiProvider {
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        Self::with_endpoint("openai", model, endpoint, Credential::Bearer(api_key))
    }

    /// Use a fully-formed completions URL and the credential it expects.
    pub fn with_endpoint(
        provider_name: &'static str,
        model: String,
        endpoint: String,
        credential: Credential,
    ) -> Self {
        Self {
            provider_name,
            model,
            endpoint,
            headers: credential.headers(),
            client: shared_client().clone(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_openai)
            .collect::<Vec<_>>();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });

        if !request.tools.is_empty() {
            let tool_defs: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": t.to_json(),
                    })
                })
                .collect();
            body["tools"] = tool_defs.into();
            body["tool_choice"] = "auto".into();
        }

        body
    }

    /// POST the request; non-2xx answers become errors before any fragment
    /// is read.
    async fn open(&self, body: &serde_json::Value) -> Result<reqwest::Response, BugwatchError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let headers = resp.headers().clone();
        let text = resp.text().await.unwrap_or_default();
        Err(error_for_response(status, &headers, &text))
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        self.provider_name
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn stream_chat(&self, request: &ProviderRequest) -> Result<FragmentStream, BugwatchError> {
        let body = self.build_request_body(request);

        debug!(
            provider = self.provider_name,
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "stream_chat"
        );

        let resp = self.retry.run(|| self.open(&body)).await?;
        Ok(sse_fragments(resp.bytes_stream()))
    }
}

/// Turn a raw SSE byte stream into fragments.
///
/// Lines are split on raw bytes so multi-byte characters cut across network
/// chunks survive. An error payload or an unparseable chunk ends the stream
/// with an `Err`.
pub fn sse_fragments<S, B>(byte_stream: S) -> FragmentStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut buffer: Vec<u8> = Vec::new();
        futures::pin_mut!(byte_stream);

        'read: loop {
            let chunk = byte_stream.next().await;
            let at_end = chunk.is_none();
            match chunk {
                Some(Ok(bytes)) => buffer.extend_from_slice(bytes.as_ref()),
                Some(Err(e)) => {
                    yield Err(BugwatchError::Network(e));
                    break;
                }
                None => buffer.push(b'\n'),
            }

            while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                let line = String::from_utf8_lossy(&raw);
                let line = line.trim();
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                if line == "data: [DONE]" || line == "data:[DONE]" {
                    break 'read;
                }
                let Some(data) = parse_sse_data(line) else {
                    continue;
                };
                match parse_chunk(data) {
                    Ok(fragments) => {
                        for fragment in fragments {
                            yield Ok(fragment);
                        }
                    }
                    Err(err) => {
                        yield Err(err);
                        break 'read;
                    }
                }
            }

            if at_end {
                break;
            }
        }
    };

    Box::pin(stream)
}

/// Decode one `data:` payload into zero or more fragments.
///
/// Each tool-call entry becomes its own fragment. An entry carrying both a
/// name and argument text is split into a name fragment followed by an
/// argument fragment.
pub fn parse_chunk(data: &str) -> Result<Vec<StreamFragment>, BugwatchError> {
    let chunk: OpenAiStreamChunk = serde_json::from_str(data)
        .map_err(|e| BugwatchError::Stream(format!("Malformed stream chunk: {e}")))?;

    if let Some(error) = chunk.error {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(BugwatchError::Stream(message));
    }

    let mut fragments = Vec::new();
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(fragments);
    };

    if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
        fragments.push(StreamFragment::text(text));
    }

    for call in choice.delta.tool_calls.unwrap_or_default() {
        let (name, arguments) = match call.function {
            Some(f) => (
                f.name.filter(|n| !n.is_empty()),
                f.arguments.filter(|a| !a.is_empty()),
            ),
            None => (None, None),
        };
        if name.is_some() {
            fragments.push(StreamFragment {
                tool_call: Some(ToolCallDelta {
                    index: call.index,
                    id: call.id.clone(),
                    name,
                    arguments: None,
                }),
                ..Default::default()
            });
            if let Some(arguments) = arguments {
                fragments.push(StreamFragment::tool_arguments(call.index, arguments));
            }
        } else if call.id.is_some() || arguments.is_some() {
            fragments.push(StreamFragment {
                tool_call: Some(ToolCallDelta {
                    index: call.index,
                    id: call.id,
                    name: None,
                    arguments,
                }),
                ..Default::default()
            });
        }
    }

    if let Some(reason) = choice.finish_reason.as_deref().and_then(FinishReason::parse) {
        fragments.push(StreamFragment::finish(reason));
    }

    Ok(fragments)
}

/// Map a history message to the Chat Completions wire format.
pub fn message_to_openai(msg: &ModelMessage) -> serde_json::Value {
    if let Some(result) = msg.tool_result_part() {
        return serde_json::json!({
            "role": "tool",
            "tool_call_id": result.tool_call_id,
            "content": result.result.to_model_content(),
        });
    }

    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };
    let text = msg.text();

    if let Some(call) = msg.tool_invocation() {
        return serde_json::json!({
            "role": role,
            "content": if text.is_empty() { serde_json::Value::Null } else { serde_json::Value::String(text) },
            "tool_calls": [{
                "id": call.id,
                "type": "function",
                "function": {
                    "name": call.name,
                    "arguments": call.arguments,
                }
            }],
        });
    }

    serde_json::json!({ "role": role, "content": text })
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: OpenAiStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAiStreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCallChunk>>,
}

#[derive(Deserialize)]
struct OpenAiToolCallChunk {
    #[serde(default)]
    index: u32,
    id: Option<String>,
    function: Option<OpenAiFunctionChunk>,
}

#[derive(Deserialize)]
struct OpenAiFunctionChunk {
    name: Option<String>,
    arguments: Option<String>,
}
