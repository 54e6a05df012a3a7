//! OAuth2 client-credentials token acquisition for the data APIs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::BugwatchError;

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Source of bearer tokens for outbound API calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, BugwatchError>;
}

/// An access token with its expiry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Whether the token can still be used at `now`, keeping a safety margin.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|exp| exp - Duration::seconds(EXPIRY_MARGIN_SECS) > now)
    }
}

/// A pre-issued token that never changes.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, BugwatchError> {
        Ok(self.0.clone())
    }
}

/// Client-credentials grant against an OAuth2 token endpoint, with caching.
///
/// A token without `expires_in` is not cached; every call fetches a new one.
pub struct ClientCredentialsAuth {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<Token>>,
}

impl ClientCredentialsAuth {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cached: Mutex::new(None),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn fetch(&self) -> Result<Token, BugwatchError> {
        debug!(url = %self.token_url, "requesting client-credentials token");
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let resp = self.client.post(&self.token_url).form(&form).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BugwatchError::Authentication(format!(
                "token endpoint returned {}: {body}",
                status.as_u16()
            )));
        }

        let payload: TokenResponse = resp.json().await?;
        if payload.access_token.is_empty() {
            return Err(BugwatchError::Authentication(
                "token endpoint returned an empty access_token".to_string(),
            ));
        }
        Ok(Token {
            access_token: payload.access_token,
            expires_at: payload
                .expires_in
                .and_then(|secs| expiry_after(Utc::now(), secs)),
        })
    }
}

/// Absolute expiry for a relative `expires_in`. Values too large to
/// represent give `None`, so the token is used once and not cached.
fn expiry_after(now: DateTime<Utc>, expires_in: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(expires_in).ok()?;
    now.checked_add_signed(Duration::try_seconds(secs)?)
}

#[async_trait]
impl TokenProvider for ClientCredentialsAuth {
    async fn access_token(&self) -> Result<String, BugwatchError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.access_token.clone());
        }
        let token = self.fetch().await?;
        let access = token.access_token.clone();
        *cached = Some(token);
        Ok(access)
    }
}

impl std::fmt::Debug for ClientCredentialsAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsAuth")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}
