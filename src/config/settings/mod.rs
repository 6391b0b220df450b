
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::chat::DEFAULT_PREFERRED_LANGUAGE;
use crate::embeddings::DEFAULT_EMBEDDING_DIMENSION;
use crate::vector_store::{CorpusSource, DEFAULT_TOP_K};

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV_VAR: &str = "DOCS_ASSISTANT_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorpusConfig {
    /// File path (relative to the config directory) or HTTP(S) URL of the corpus JSON
    pub source: String,
    pub embedding_dimension: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            source: "vector_store.json".to_string(),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
        }
    }
}

/// Which completion service answers prompts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// OpenAI-compatible completion endpoint, e.g. LM Studio
    #[default]
    Local,
    /// Hosted text-generation inference API
    Hosted,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Hosted => write!(f, "hosted"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: BackendKind,
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub completions_path: String,
    pub hosted_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 1234,
            completions_path: "/v1/completions".to_string(),
            hosted_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "TheBloke/Mistral-7B-v0.1-GGUF".to_string(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 1024,
            timeout_seconds: 60,
            retry_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AssistantConfig {
    pub assistant_name: String,
    pub product_name: String,
    pub preferred_language: String,
    pub top_k: usize,
    /// Hide diagnostic details from error replies
    pub production: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            assistant_name: "Docs Assistant".to_string(),
            product_name: "the documented service".to_string(),
            preferred_language: DEFAULT_PREFERRED_LANGUAGE.to_string(),
            top_k: DEFAULT_TOP_K,
            production: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid completions path: {0} (must start with '/')")]
    InvalidCompletionsPath(String),
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("Invalid max tokens: {0} (must be between 1 and 32768)")]
    InvalidMaxTokens(u32),
    #[error("Invalid timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid retry attempts: {0} (must be between 1 and 10)")]
    InvalidRetryAttempts(u32),
    #[error("Invalid corpus source: {0}")]
    InvalidCorpusSource(String),
    #[error("Invalid embedding dimension: {0} (must be between 1 and 4096)")]
    InvalidEmbeddingDimension(usize),
    #[error("Invalid top-k: {0} (must be between 1 and 50)")]
    InvalidTopK(usize),
    #[error("Invalid assistant name: {0} (cannot be empty)")]
    InvalidAssistantName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus: CorpusConfig::default(),
            model: ModelConfig::default(),
            assistant: AssistantConfig::default(),
            base_dir: Self::config_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Get the configuration directory path
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".docs-assistant"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("docs-assistant"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Get the base directory for the application
    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.corpus.validate()?;
        self.model.validate()?;
        self.assistant.validate()?;
        Ok(())
    }

    /// Resolve the corpus source. Relative file paths are taken from the config directory.
    #[inline]
    pub fn corpus_source(&self) -> Result<CorpusSource, ConfigError> {
        let source = CorpusSource::parse(&self.corpus.source)
            .map_err(|_| ConfigError::InvalidCorpusSource(self.corpus.source.clone()))?;

        Ok(match source {
            CorpusSource::File(path) if path.is_relative() => {
                CorpusSource::File(self.get_base_dir().join(path))
            }
            other => other,
        })
    }
}

impl CorpusConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        CorpusSource::parse(&self.source)
            .map_err(|_| ConfigError::InvalidCorpusSource(self.source.clone()))?;

        if !(1..=4096).contains(&self.embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding_dimension,
            ));
        }

        Ok(())
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if !self.completions_path.starts_with('/') {
            return Err(ConfigError::InvalidCompletionsPath(
                self.completions_path.clone(),
            ));
        }

        self.local_url()?;
        self.hosted_base_url()?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }

        if !(1..=32768).contains(&self.max_tokens) {
            return Err(ConfigError::InvalidMaxTokens(self.max_tokens));
        }

        if !(1..=600).contains(&self.timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(self.timeout_seconds));
        }

        if !(1..=10).contains(&self.retry_attempts) {
            return Err(ConfigError::InvalidRetryAttempts(self.retry_attempts));
        }

        Ok(())
    }

    /// Full URL of the local completion endpoint
    pub fn local_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!(
            "{}://{}:{}{}",
            self.protocol, self.host, self.port, self.completions_path
        );
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    /// Base URL of the hosted inference API, without the model segment
    pub fn hosted_base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.hosted_url)
            .map_err(|_| ConfigError::InvalidUrl(self.hosted_url.clone()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidProtocol(url.scheme().to_string()));
        }
        Ok(url)
    }

    /// Configured API key, falling back to the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV_VAR).ok())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn set_protocol(&mut self, protocol: String) -> Result<(), ConfigError> {
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::InvalidProtocol(protocol));
        }
        self.protocol = protocol;
        Ok(())
    }

    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        let temp_config = ModelConfig {
            host: host.clone(),
            ..self.clone()
        };
        temp_config.local_url()?;
        self.host = host;
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }

    pub fn set_hosted_url(&mut self, hosted_url: String) -> Result<(), ConfigError> {
        let temp_config = ModelConfig {
            hosted_url: hosted_url.clone(),
            ..self.clone()
        };
        temp_config.hosted_base_url()?;
        self.hosted_url = hosted_url;
        Ok(())
    }

    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }

    pub fn set_temperature(&mut self, temperature: f32) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidTemperature(temperature));
        }
        self.temperature = temperature;
        Ok(())
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) -> Result<(), ConfigError> {
        if !(1..=32768).contains(&max_tokens) {
            return Err(ConfigError::InvalidMaxTokens(max_tokens));
        }
        self.max_tokens = max_tokens;
        Ok(())
    }
}

impl AssistantConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assistant_name.trim().is_empty() {
            return Err(ConfigError::InvalidAssistantName(
                self.assistant_name.clone(),
            ));
        }

        if !(1..=50).contains(&self.top_k) {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }

        Ok(())
    }
}
