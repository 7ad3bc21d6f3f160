//! Configuration Management
//!
//! Handles persistent configuration storage for reify.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the API domain
pub const DOMAIN_ENV: &str = "BIGML_DOMAIN";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Account name
    #[serde(default)]
    pub username: Option<String>,
    /// API key
    #[serde(default)]
    pub api_key: Option<String>,
    /// API host, e.g. `bigml.io`
    #[serde(default)]
    pub domain: Option<String>,
    /// Directory for stored copies of fetched resources
    #[serde(default)]
    pub storage: Option<PathBuf>,
    /// Default output language
    #[serde(default)]
    pub language: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("reify").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config file {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get effective domain (env > config > public API)
    pub fn effective_domain(&self) -> String {
        std::env::var(DOMAIN_ENV)
            .ok()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| self.domain.clone())
            .unwrap_or_else(|| crate::api::client::DEFAULT_DOMAIN.to_string())
    }

    /// Get effective storage directory (CLI > config > working directory)
    pub fn effective_storage(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.storage.clone())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get effective language (CLI > config > python)
    pub fn effective_language(&self, cli: Option<String>) -> String {
        cli.or_else(|| self.language.clone())
            .unwrap_or_else(|| "python".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_parses() {
        let config: Config = serde_json::from_str(r#"{"username": "alfred"}"#).unwrap();
        assert_eq!(config.username.as_deref(), Some("alfred"));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = Config {
            language: Some("json".to_string()),
            storage: Some(PathBuf::from("/tmp/stored")),
            ..Config::default()
        };
        assert_eq!(config.effective_language(None), "json");
        assert_eq!(config.effective_language(Some("python".to_string())), "python");
        assert_eq!(
            config.effective_storage(Some(PathBuf::from("here"))),
            PathBuf::from("here")
        );
        assert_eq!(config.effective_storage(None), PathBuf::from("/tmp/stored"));
    }
}
