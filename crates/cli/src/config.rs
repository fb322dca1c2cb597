//! Configuration loading from fcall.toml.

use runtime::{AnthropicAuth, DEFAULT_ANTHROPIC_VERSION, DEFAULT_BASE_URL, OnInvalidCall};
use serde::Deserialize;
use std::path::Path;

const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Text protocol behaviour.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Backend provider configuration.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    /// Anthropic API key. Falls back to `ANTHROPIC_API_KEY`.
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Protocol tag sent with every text-protocol request.
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: default_base_url(),
            anthropic_version: default_anthropic_version(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrchestratorConfig {
    /// What to do when the model's call text cannot be run.
    #[serde(default)]
    pub on_invalid_call: OnInvalidCall,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_anthropic_version() -> String {
    DEFAULT_ANTHROPIC_VERSION.to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.backend.max_tokens == 0 {
            return Err(ConfigError::Parse("backend.max_tokens must be positive".into()));
        }
        Ok(config)
    }

    /// Build the authentication from config, then the environment.
    pub fn auth(&self) -> Result<AnthropicAuth, ConfigError> {
        self.auth_with(std::env::var(API_KEY_VAR).ok())
    }

    fn auth_with(&self, env_key: Option<String>) -> Result<AnthropicAuth, ConfigError> {
        self.backend
            .api_key
            .clone()
            .or(env_key)
            .filter(|key| !key.is_empty())
            .map(AnthropicAuth::ApiKey)
            .ok_or(ConfigError::MissingAuth)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("authentication not configured: set backend.api_key or {API_KEY_VAR}")]
    MissingAuth,
}
