//! Configuration system (layered: defaults < TOML file < environment).

use std::fmt;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::BugwatchError;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-10-21";
pub const DEFAULT_API_BASE_URL: &str = "https://apix.cisco.com";
pub const DEFAULT_TOKEN_URL: &str = "https://id.cisco.com/oauth2/default/v1/token";
pub const DEFAULT_MAX_ITERATIONS: u32 = 2;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant for information on Cisco Defects and PSIRTs. \
For queries on PSIRT you can use get_security_advisories and for defects you can use get_bugs_by_keyword.";

/// Which chat-completions backend to talk to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Azure,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
        })
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = BugwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "azure" | "azure-openai" => Ok(Self::Azure),
            other => Err(BugwatchError::Configuration(format!(
                "Unknown provider '{other}' (expected 'openai' or 'azure')"
            ))),
        }
    }
}

/// `[model]` section.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelSettings {
    pub provider: ProviderKind,
    /// Model name, or deployment name for Azure.
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub azure_endpoint: Option<String>,
    pub azure_api_version: String,
    /// Attempts to open a model stream when the service is busy or
    /// unreachable (1 disables retries).
    pub max_attempts: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: None,
            azure_endpoint: None,
            azure_api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSettings")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("azure_endpoint", &self.azure_endpoint)
            .field("azure_api_version", &self.azure_api_version)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// `[api]` section: the advisory/defect service.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub token_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub advisory_page_size: u32,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id: None,
            client_secret: None,
            advisory_page_size: 5,
            request_timeout_secs: 30,
        }
    }
}

impl ApiSettings {
    /// Client id and secret for the client-credentials grant.
    pub fn credentials(&self) -> Result<(&str, &str), BugwatchError> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok((id, secret)),
            _ => Err(BugwatchError::Configuration(
                "Missing CLIENTID / CLIENTSECRET for the advisory API".into(),
            )),
        }
    }
}

impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSettings")
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| ".."))
            .field("advisory_page_size", &self.advisory_page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// `[agent]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentSettings {
    pub max_iterations: u32,
    pub system_prompt: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BugwatchConfig {
    pub model: ModelSettings,
    pub api: ApiSettings,
    pub agent: AgentSettings,
}

impl BugwatchConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, BugwatchError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, BugwatchError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// `$BUGWATCH_CONFIG`, else `<config dir>/bugwatch/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("BUGWATCH_CONFIG") {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("", "", "bugwatch").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load the full layered configuration.
    ///
    /// An explicit `path` must exist; the default path is optional. `.env`
    /// is loaded if present.
    pub fn load(path: Option<&Path>) -> Result<Self, BugwatchError> {
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults overlaid with the process environment only.
    pub fn from_env() -> Result<Self, BugwatchError> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay environment values. `lookup` abstracts the environment so
    /// the mapping is testable.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), BugwatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("BUGWATCH_PROVIDER") {
            self.model.provider = provider.parse()?;
        }
        if let Some(model) = get("BUGWATCH_MODEL") {
            self.model.model = model;
        }
        match self.model.provider {
            ProviderKind::OpenAi => {
                if let Some(key) = get("OPENAI_API_KEY") {
                    self.model.api_key = Some(key);
                }
                if let Some(url) = get("OPENAI_BASE_URL") {
                    self.model.base_url = Some(url);
                }
            }
            ProviderKind::Azure => {
                if let Some(key) = get("AZURE_OPENAI_API_KEY") {
                    self.model.api_key = Some(key);
                }
                if let Some(endpoint) = get("AZURE_OPENAI_ENDPOINT") {
                    self.model.azure_endpoint = Some(endpoint);
                }
                if let Some(version) = get("AZURE_OPENAI_API_VERSION") {
                    self.model.azure_api_version = version;
                }
            }
        }

        if let Some(url) = get("BUGWATCH_API_BASE_URL") {
            self.api.base_url = url;
        }
        if let Some(url) = get("BUGWATCH_TOKEN_URL") {
            self.api.token_url = url;
        }
        if let Some(id) = get("CLIENTID") {
            self.api.client_id = Some(id);
        }
        if let Some(secret) = get("CLIENTSECRET") {
            self.api.client_secret = Some(secret);
        }

        if let Some(raw) = get("BUGWATCH_MAX_ITERATIONS") {
            self.agent.max_iterations = raw.trim().parse().map_err(|_| {
                BugwatchError::Configuration(format!(
                    "BUGWATCH_MAX_ITERATIONS must be a positive integer, got '{raw}'"
                ))
            })?;
        }
        Ok(())
    }

    /// Reject configurations that cannot run a turn.
    pub fn validate(&self) -> Result<(), BugwatchError> {
        if self.agent.max_iterations == 0 {
            return Err(BugwatchError::Configuration(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.model.max_attempts == 0 {
            return Err(BugwatchError::Configuration(
                "max_attempts must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.api.advisory_page_size) {
            return Err(BugwatchError::Configuration(format!(
                "advisory_page_size must be between 1 and 100, got {}",
                self.api.advisory_page_size
            )));
        }
        if self.model.api_key.as_deref().map_or(true, str::is_empty) {
            let var = match self.model.provider {
                ProviderKind::OpenAi => "OPENAI_API_KEY",
                ProviderKind::Azure => "AZURE_OPENAI_API_KEY",
            };
            return Err(BugwatchError::Configuration(format!("Missing {var}")));
        }
        if self.model.provider == ProviderKind::Azure && self.model.azure_endpoint.is_none() {
            return Err(BugwatchError::Configuration(
                "Missing AZURE_OPENAI_ENDPOINT".into(),
            ));
        }
        Ok(())
    }
}
