//! Azure OpenAI provider.

use async_trait::async_trait;

use crate::error::BugwatchError;

use super::http::Credential;
use super::openai::OpenAiProvider;
use super::retry::RetryPolicy;
use super::{FragmentStream, ModelProvider, ProviderRequest};

/// Azure OpenAI Service provider: same wire format as OpenAI, addressed by
/// deployment and authenticated with an `api-key` header.
pub struct AzureOpenAiProvider {
    inner: OpenAiProvider,
}

impl AzureOpenAiProvider {
    /// Create with Azure-specific endpoint.
    /// `endpoint`: e.g., "https://myresource.openai.azure.com"
    /// `deployment`: e.g., "gpt-4o"
    /// `api_version`: e.g., "2024-10-21"
    pub fn new(endpoint: String, deployment: String, api_key: String, api_version: String) -> Self {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            api_version
        );
        Self {
            inner: OpenAiProvider::with_endpoint("azure", deployment, url, Credential::ApiKey(api_key)),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.inner = self.inner.with_http_client(client);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.inner = self.inner.with_retry_policy(retry);
        self
    }

    pub fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}

#[async_trait]
impl ModelProvider for AzureOpenAiProvider {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn stream_chat(&self, request: &ProviderRequest) -> Result<FragmentStream, BugwatchError> {
        self.inner.stream_chat(request).await
    }
}
