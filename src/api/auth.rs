//! API Authentication
//!
//! The service authenticates every request with a username and API key sent
//! as query parameters. Credentials come from the environment first, then
//! from the user configuration file.

use crate::config::Config;
use anyhow::Result;

/// Environment variable holding the account name
pub const USERNAME_ENV: &str = "BIGML_USERNAME";
/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "BIGML_API_KEY";

/// Length of an API key (hex encoded SHA-1)
const API_KEY_LENGTH: usize = 40;

/// Account credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Security: never print the key
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: &str, api_key: &str) -> Result<Self> {
        if !validate_username(username) {
            return Err(anyhow::anyhow!("Invalid username format: '{}'", username));
        }
        if !validate_api_key(api_key) {
            return Err(anyhow::anyhow!(
                "Invalid API key format for user '{}'",
                username
            ));
        }

        Ok(Self {
            username: username.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Resolve credentials (env > config file)
    pub fn resolve(config: &Config) -> Result<Self> {
        let username = std::env::var(USERNAME_ENV)
            .ok()
            .or_else(|| config.username.clone());
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .or_else(|| config.api_key.clone());

        match (username, api_key) {
            (Some(username), Some(api_key)) => Self::new(username.trim(), api_key.trim()),
            _ => Err(anyhow::anyhow!(
                "No credentials configured. Set {} and {} or add them to {}",
                USERNAME_ENV,
                API_KEY_ENV,
                Config::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "the config file".to_string())
            )),
        }
    }

    /// Authentication part of a request query string
    pub fn query(&self) -> String {
        format!(
            "username={}&api_key={}",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.api_key)
        )
    }
}

/// Usernames are non-empty and made of letters, digits, `_`, `-` and `.`
fn validate_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= 64
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// API keys are 40 hex characters
fn validate_api_key(api_key: &str) -> bool {
    api_key.len() == API_KEY_LENGTH && api_key.chars().all(|c| c.is_ascii_hexdigit())
}
