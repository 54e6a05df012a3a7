//! Model provider trait and implementations.

pub mod http;
pub mod retry;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "azure")]
pub mod azure;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::{ModelSettings, ProviderKind};
use crate::error::BugwatchError;
use crate::tools::ToolSpec;
use crate::types::{ModelMessage, StreamFragment};

/// Ordered fragments of one streamed model response.
pub type FragmentStream = BoxStream<'static, Result<StreamFragment, BugwatchError>>;

/// A request sent to a model provider: the full history plus the tools the
/// model may call.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub tools: Vec<ToolSpec>,
}

/// Core trait implemented by all model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "openai", "azure").
    fn provider_name(&self) -> &str;
    /// The model ID (or deployment) this provider instance serves.
    fn model_id(&self) -> &str;

    /// Start a streamed chat completion. Errors before the first fragment
    /// (connection, non-2xx) come back as `Err`; mid-stream faults arrive
    /// as `Err` items.
    async fn stream_chat(&self, request: &ProviderRequest) -> Result<FragmentStream, BugwatchError>;
}

/// Create a provider from the model section of the configuration.
#[allow(unused_variables)]
pub fn create_provider(settings: &ModelSettings) -> Result<Arc<dyn ModelProvider>, BugwatchError> {
    let retry = retry::RetryPolicy::default().with_max_attempts(settings.max_attempts);
    match settings.provider {
        #[cfg(feature = "openai")]
        ProviderKind::OpenAi => {
            let api_key = settings
                .api_key
                .clone()
                .ok_or_else(|| BugwatchError::Authentication("Missing OPENAI_API_KEY".into()))?;
            Ok(Arc::new(
                openai::OpenAiProvider::new(settings.model.clone(), api_key, settings.base_url.clone())
                    .with_retry_policy(retry),
            ))
        }
        #[cfg(feature = "azure")]
        ProviderKind::Azure => {
            let api_key = settings.api_key.clone().ok_or_else(|| {
                BugwatchError::Authentication("Missing AZURE_OPENAI_API_KEY".into())
            })?;
            let endpoint = settings.azure_endpoint.clone().ok_or_else(|| {
                BugwatchError::Configuration("Missing AZURE_OPENAI_ENDPOINT".into())
            })?;
            Ok(Arc::new(
                azure::AzureOpenAiProvider::new(
                    endpoint,
                    settings.model.clone(),
                    api_key,
                    settings.azure_api_version.clone(),
                )
                .with_retry_policy(retry),
            ))
        }
        #[allow(unreachable_patterns)]
        _ => Err(BugwatchError::Configuration(format!(
            "Provider '{}' not enabled via feature flags",
            settings.provider
        ))),
    }
}

#[cfg(all(test, feature = "azure"))]
mod tests {
    use super::*;

    #[test]
    fn factory_picks_provider_by_kind() {
        let mut settings = ModelSettings {
            api_key: Some("sk-test".into()),
            ..ModelSettings::default()
        };
        let provider = create_provider(&settings).unwrap();
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.model_id(), "gpt-4o");

        settings.provider = ProviderKind::Azure;
        settings.azure_endpoint = Some("https://res.openai.azure.com".into());
        let provider = create_provider(&settings).unwrap();
        assert_eq!(provider.provider_name(), "azure");
    }

    #[test]
    fn factory_requires_credentials() {
        let err = create_provider(&ModelSettings::default()).err().unwrap();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
