//! HTTP plumbing shared by the chat providers: credentials, SSE framing and
//! mapping of failed responses.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::error::BugwatchError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Process-wide client for model traffic.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// How a chat endpoint expects its key.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer <key>` (OpenAI).
    Bearer(String),
    /// `api-key: <key>` (Azure OpenAI).
    ApiKey(String),
}

impl Credential {
    /// JSON content type plus the credential header. A key that is not a
    /// valid header value is left out and the endpoint will answer 401.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let (name, value) = match self {
            Self::Bearer(key) => (AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))),
            Self::ApiKey(key) => (
                reqwest::header::HeaderName::from_static("api-key"),
                HeaderValue::from_str(key),
            ),
        };
        if let Ok(mut value) = value {
            value.set_sensitive(true);
            headers.insert(name, value);
        }
        headers
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Bearer(_) => "Bearer(..)",
            Self::ApiKey(_) => "ApiKey(..)",
        })
    }
}

/// Payload of an SSE `data:` line; `None` for other lines and `[DONE]`.
pub fn parse_sse_data(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data:")?.trim_start();
    (data != "[DONE]").then_some(data)
}

/// Map a non-2xx chat response to a crate error.
///
/// 429s carry the server's wait hint, taken from `retry-after-ms`, then
/// `retry-after` (seconds), then an `error.retry_after` field in the body.
pub fn error_for_response(status: StatusCode, headers: &HeaderMap, body: &str) -> BugwatchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BugwatchError::Authentication(body.to_string())
        }
        StatusCode::TOO_MANY_REQUESTS => BugwatchError::RateLimited {
            retry_after_ms: header_retry_hint(headers).or_else(|| body_retry_hint(body)),
        },
        other => BugwatchError::api(other.as_u16(), body),
    }
}

fn header_retry_hint(headers: &HeaderMap) -> Option<u64> {
    let number = |name: &str| -> Option<u64> { headers.get(name)?.to_str().ok()?.trim().parse().ok() };
    number("retry-after-ms").or_else(|| number("retry-after").map(|secs| secs.saturating_mul(1000)))
}

fn body_retry_hint(body: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let secs = value.get("error")?.get("retry_after")?.as_f64()?;
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs.min(86_400.0)).as_millis() as u64)
}
