//! Authenticated HTTP client for the advisory and defect APIs.

use std::sync::Arc;

use reqwest::Url;
use tracing::debug;

use super::auth::TokenProvider;
use crate::error::BugwatchError;

/// GETs text resources from the data APIs with a bearer token.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenProvider>) -> Result<Self, BugwatchError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            BugwatchError::Configuration(format!("invalid API base URL '{base_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(BugwatchError::Configuration(format!(
                "API base URL '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            tokens,
        })
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Build an endpoint URL by appending percent-encoded path segments.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, BugwatchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BugwatchError::Configuration("API base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url` with `query`, returning the body text of a 2xx response.
    ///
    /// Non-2xx responses become [`BugwatchError::Api`] carrying the status and
    /// body.
    pub async fn get_text(&self, url: Url, query: &[(&str, String)]) -> Result<String, BugwatchError> {
        let token = self.tokens.access_token().await?;
        debug!(url = %url, "GET");
        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(BugwatchError::api(status.as_u16(), body));
        }
        Ok(body)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::StaticToken;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Arc::new(StaticToken::new("t"))).unwrap()
    }

    #[test]
    fn endpoint_encodes_segments() {
        let url = client("https://apix.example.com")
            .endpoint(&["bug", "v3.0", "bugs", "keyword", "memory leak"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://apix.example.com/bug/v3.0/bugs/keyword/memory%20leak"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let url = client("http://127.0.0.1:9000/proxy/")
            .endpoint(&["security", "advisories"])
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/proxy/security/advisories");
    }

    #[test]
    fn slash_in_keyword_stays_one_segment() {
        let url = client("https://apix.example.com")
            .endpoint(&["keyword", "asr/9000"])
            .unwrap();
        assert!(url.as_str().ends_with("/keyword/asr%2F9000"));
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = ApiClient::new("not a url", Arc::new(StaticToken::new("t"))).unwrap_err();
        assert!(matches!(err, BugwatchError::Configuration(_)));
    }
}
