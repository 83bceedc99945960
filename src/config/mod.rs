//! Configuration system
//!
//! Loads ~/.config/jiraform/config.yaml with support for:
//! - Jira site URL and account credentials (with environment fallback)
//! - HTTP timeout and rate-limit retry budget
//! - State file location

mod jiraform_config;
pub mod validation;

pub use jiraform_config::{
    ClientConfig, ConnectionConfig, JiraformConfig, ENV_API_TOKEN, ENV_EMAIL, ENV_URL,
};
pub use validation::{validate_config, validate_config_result, ValidationError};
