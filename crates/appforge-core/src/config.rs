//! Configuration management for appforge
//!
//! This module provides the service configuration: listen address, notifier
//! retry policy, pipeline limits, and the model and repository provider
//! endpoints. Everything has a default so the file is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{AppforgeError, Result};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "appforge.toml";

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppforgeConfig {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Evaluation notifier retry policy
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Pipeline scheduling
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Code generation model
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Hosted repository provider
    #[serde(default)]
    pub publisher: PublisherConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body; attachments travel inline as data URLs
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Retry policy for evaluation notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Total attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles for each later retry
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

/// Pipeline scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline runs allowed in flight at once
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,

    /// Where decoded attachments are written (system temp dir when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_dir: Option<PathBuf>,
}

/// Code generation model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_model_api_url")]
    pub api_url: String,

    /// Environment variable holding the model API key
    #[serde(default = "default_model_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

/// Hosted repository provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    #[serde(default = "default_publisher_api_url")]
    pub api_url: String,

    /// Branch files are committed to and pages are served from
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Environment variable holding the provider access token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

// Default value providers
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_concurrent_runs() -> usize {
    16
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_model_api_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_model_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_max_tokens() -> usize {
    8000
}

fn default_publisher_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

impl AppforgeConfig {
    /// Load configuration from `path` or use defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| {
                AppforgeError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Write the default configuration to `path`
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| AppforgeError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl NotifierConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl PipelineConfig {
    pub fn attachment_dir(&self) -> PathBuf {
        self.attachment_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: default_max_concurrent_runs(),
            attachment_dir: None,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_url: default_model_api_url(),
            api_key_env: default_model_key_env(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            api_url: default_publisher_api_url(),
            branch: default_branch(),
            token_env: default_token_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppforgeConfig::default();
        assert_eq!(config.notifier.max_attempts, 5);
        assert_eq!(config.notifier.base_delay(), Duration::from_secs(1));
        assert_eq!(config.publisher.token_env, "GITHUB_TOKEN");
        assert_eq!(config.publisher.branch, "main");
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.server.max_body_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppforgeConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[server]\nport = 9100\n\n[notifier]\nbase_delay_ms = 10\n").unwrap();

        let config = AppforgeConfig::load_or_default(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.notifier.base_delay_ms, 10);
        assert_eq!(config.notifier.max_attempts, 5);
        assert_eq!(config.pipeline.max_concurrent_runs, 16);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[server\nport = ").unwrap();

        let err = AppforgeConfig::load_or_default(&path).unwrap_err();
        assert!(matches!(err, AppforgeError::Config(_)));
    }

    #[test]
    fn test_write_default_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_CONFIG_FILE);
        AppforgeConfig::write_default(&path).unwrap();

        let config = AppforgeConfig::load_or_default(&path).unwrap();
        assert_eq!(config.generator.api_key_env, "ANTHROPIC_API_KEY");
    }
}
