//! Configuration management for OpenCoder
//!
//! Loads and saves assistant settings from `~/.opencoder/config.json`,
//! with environment variables overlaid on top of the file contents.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub mod paths;

pub use paths::{config_path, data_dir, memory_path, workspace_path};

/// Errors in configuration handling
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config not found: {0}")]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Credentials and endpoint for one model provider
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// All configured providers
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Providers {
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub anthropic: ProviderConfig,
    #[serde(default)]
    pub ollama: ProviderConfig,
}

/// Default assistant parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_max_followup_rounds")]
    pub max_followup_rounds: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            language: default_language(),
            max_followup_rounds: default_max_followup_rounds(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_language() -> String {
    "en".to_string()
}

fn default_max_followup_rounds() -> usize {
    3
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub providers: Providers,
}

impl Config {
    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to a specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("saving config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Overlay API credentials from the environment.
    ///
    /// Environment variables win over the config file so a key never has
    /// to be written to disk.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.providers.openai.api_key = key;
            }
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            if !key.is_empty() {
                self.providers.anthropic.api_key = key;
            }
        }
        if let Ok(base) = std::env::var("OLLAMA_BASE_URL") {
            if !base.is_empty() {
                self.providers.ollama.api_base = Some(base);
            }
        }
    }

    /// Look up the provider section by name
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "openai" => Some(&self.providers.openai),
            "anthropic" => Some(&self.providers.anthropic),
            "ollama" => Some(&self.providers.ollama),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.defaults.provider, "openai");
        assert_eq!(config.defaults.model, "gpt-4o-mini");
        assert_eq!(config.defaults.max_tokens, 4096);
        assert_eq!(config.defaults.temperature, 0.7);
        assert_eq!(config.defaults.language, "en");
        assert_eq!(config.defaults.max_followup_rounds, 3);
        assert!(config.providers.openai.api_key.is_empty());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let json = r#"{ "defaults": { "model": "gpt-4o" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.defaults.model, "gpt-4o");
        // unspecified fields fall back to defaults
        assert_eq!(config.defaults.provider, "openai");
        assert_eq!(config.defaults.max_followup_rounds, 3);
    }

    #[test]
    fn test_provider_lookup() {
        let mut config = Config::default();
        config.providers.anthropic.api_key = "sk-ant-test".to_string();

        assert_eq!(
            config.provider("anthropic").map(|p| p.api_key.as_str()),
            Some("sk-ant-test")
        );
        assert!(config.provider("unknown").is_none());
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let config = Config::load_from(&path).await.unwrap();
        assert_eq!(config.defaults.provider, "openai");
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.defaults.model = "claude-sonnet-4".to_string();
        config.defaults.provider = "anthropic".to_string();
        config.providers.anthropic.api_key = "sk-ant-123".to_string();

        config.save_to(&path).await.unwrap();
        let loaded = Config::load_from(&path).await.unwrap();

        assert_eq!(loaded.defaults.model, "claude-sonnet-4");
        assert_eq!(loaded.defaults.provider, "anthropic");
        assert_eq!(loaded.providers.anthropic.api_key, "sk-ant-123");
    }

    #[tokio::test]
    async fn test_load_invalid_json_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let result = Config::load_from(&path).await;
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
