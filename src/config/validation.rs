//! Configuration validation
//!
//! Validates jiraform configuration before any client is built:
//! - Connection credentials are complete
//! - The site URL is http(s)
//! - Client limits are non-zero

use super::jiraform_config::{JiraformConfig, ENV_API_TOKEN, ENV_EMAIL, ENV_URL};
use crate::JiraformError;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a jiraform configuration, collecting every problem
pub fn validate_config(config: &JiraformConfig) -> ValidationResult {
    let mut errors = Vec::new();
    let connection = &config.connection;

    match connection.url.as_deref() {
        None => errors.push(ValidationError::new(
            "connection.url",
            format!("Jira URL is required (set it in the config file or {})", ENV_URL),
        )),
        Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
            errors.push(ValidationError::new(
                "connection.url",
                format!("Invalid Jira URL: {}", url),
            ))
        }
        Some(_) => {}
    }

    if connection.email.as_deref().map_or(true, str::is_empty) {
        errors.push(ValidationError::new(
            "connection.email",
            format!("Account email is required (set it in the config file or {})", ENV_EMAIL),
        ));
    }

    if connection.api_token.as_deref().map_or(true, str::is_empty) {
        errors.push(ValidationError::new(
            "connection.api_token",
            format!(
                "API token is required (set it in the config file or {})",
                ENV_API_TOKEN
            ),
        ));
    }

    if config.client.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "client.timeout_secs",
            "Timeout must be greater than 0",
        ));
    }

    if config.client.max_rate_limit_retries == 0 {
        tracing::warn!("max_rate_limit_retries is 0; every rate limit will be fatal");
    }

    if config.client.max_retry_wait_secs == 0 {
        errors.push(ValidationError::new(
            "client.max_retry_wait_secs",
            "Maximum retry wait must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &JiraformConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        JiraformError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}
