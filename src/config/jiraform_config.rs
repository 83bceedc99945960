//! Jiraform configuration file handling
//!
//! Loads and manages the ~/.config/jiraform/config.yaml file. Connection
//! settings left out of the file fall back to JIRA_URL, JIRA_EMAIL and
//! JIRA_API_TOKEN.

use crate::Result;
use jira_rest::{Credentials, JiraClient, RetryConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_URL: &str = "JIRA_URL";
pub const ENV_EMAIL: &str = "JIRA_EMAIL";
pub const ENV_API_TOKEN: &str = "JIRA_API_TOKEN";

/// Jira site and account used for every request
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Site URL, e.g. https://example.atlassian.net
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Account email (HTTP Basic principal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// API token (HTTP Basic secret)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("email", &self.email)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ConnectionConfig {
    /// Fill unset values from the environment; values in the file win
    pub fn with_env_fallback(mut self) -> Self {
        self.url = self.url.or_else(|| env_value(ENV_URL));
        self.email = self.email.or_else(|| env_value(ENV_EMAIL));
        self.api_token = self.api_token.or_else(|| env_value(ENV_API_TOKEN));
        self
    }

    /// Credentials, if all three values are present
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.url, &self.email, &self.api_token) {
            (Some(url), Some(email), Some(token)) => {
                Some(Credentials::new(url.as_str(), email.as_str(), token.as_str()))
            }
            _ => None,
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// HTTP client behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client-wide request deadline in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Cumulative Retry-After waits before a rate limit is fatal
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,

    /// Cap on a single server-requested wait, in seconds
    #[serde(default = "default_max_retry_wait_secs")]
    pub max_retry_wait_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_rate_limit_retries() -> u32 {
    5
}

fn default_max_retry_wait_secs() -> u64 {
    300
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            max_retry_wait_secs: default_max_retry_wait_secs(),
        }
    }
}

impl ClientConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_rate_limit_retries,
            max_wait: Duration::from_secs(self.max_retry_wait_secs),
        }
    }
}

/// Jiraform configuration
///
/// Represents the complete ~/.config/jiraform/config.yaml file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraformConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub client: ClientConfig,

    /// Where instance state is stored between runs
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

fn default_state_path() -> PathBuf {
    PathBuf::from("jiraform.state.json")
}

impl Default for JiraformConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl JiraformConfig {
    /// Create a configuration with defaults and no connection settings
    pub fn new() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            client: ClientConfig::default(),
            state_path: default_state_path(),
        }
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::JiraformError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading jiraform configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            timeout_secs = config.client.timeout_secs,
            max_rate_limit_retries = config.client.max_rate_limit_retries,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load from `path` if given, else the default path; a missing file at the
    /// default path yields defaults. Environment fallback is applied either way.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::load(&default)?
                } else {
                    tracing::debug!(path = %default.display(), "No config file, using defaults");
                    Self::new()
                }
            }
        };
        Ok(config.with_env_fallback())
    }

    pub fn with_env_fallback(mut self) -> Self {
        self.connection = self.connection.with_env_fallback();
        self
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving jiraform configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/jiraform/config.yaml)
    pub fn default_path() -> PathBuf {
        // Always use ~/.config for consistency across platforms (macOS, Linux)
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("jiraform");
        path.push("config.yaml");
        path
    }

    /// Validate and build a client from this configuration
    pub fn build_client(&self) -> Result<JiraClient> {
        super::validation::validate_config_result(self)?;

        let credentials = self.connection.credentials().ok_or_else(|| {
            crate::JiraformError::Config("Jira credentials are incomplete".to_string())
        })?;

        let client = JiraClient::connect(
            credentials,
            Duration::from_secs(self.client.timeout_secs),
        )?
        .with_retry(self.client.retry_config());

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = JiraformConfig::new();
        assert_eq!(config.client.timeout_secs, 30);
        assert_eq!(config.client.max_rate_limit_retries, 5);
        assert_eq!(config.state_path, PathBuf::from("jiraform.state.json"));

        let retry = config.client.retry_config();
        assert_eq!(retry.max_retries, 5);
        assert_eq!(retry.max_wait, Duration::from_secs(300));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");

        let mut config = JiraformConfig::new();
        config.connection.url = Some("https://example.atlassian.net".to_string());
        config.connection.email = Some("admin@example.com".to_string());
        config.client.max_rate_limit_retries = 2;
        config.save(&path).unwrap();

        let loaded = JiraformConfig::load(&path).unwrap();
        assert_eq!(
            loaded.connection.url.as_deref(),
            Some("https://example.atlassian.net")
        );
        assert_eq!(loaded.client.max_rate_limit_retries, 2);
        assert_eq!(loaded.client.timeout_secs, 30);
        assert!(loaded.connection.api_token.is_none());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: JiraformConfig =
            serde_yaml::from_str("connection:\n  url: https://x.atlassian.net\n").unwrap();
        assert_eq!(config.client.max_retry_wait_secs, 300);
        assert_eq!(config.state_path, PathBuf::from("jiraform.state.json"));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = JiraformConfig::load(temp_dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(crate::JiraformError::Config(_))));
    }

    #[test]
    fn test_file_value_wins_over_env() {
        let connection = ConnectionConfig {
            url: Some("https://file.atlassian.net".to_string()),
            email: Some("file@example.com".to_string()),
            api_token: Some("file-token".to_string()),
        }
        .with_env_fallback();

        assert_eq!(connection.url.as_deref(), Some("https://file.atlassian.net"));
        let credentials = connection.credentials().unwrap();
        assert_eq!(credentials.email, "file@example.com");
    }

    #[test]
    fn test_debug_redacts_token() {
        let connection = ConnectionConfig {
            api_token: Some("very-secret".to_string()),
            ..Default::default()
        };
        assert!(!format!("{:?}", connection).contains("very-secret"));
    }
}
