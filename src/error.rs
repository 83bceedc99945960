//! Error types for Jiraform
//!
//! Every failure carries a classification ([`ErrorClass`]) so the CLI can tell
//! an operator whether to wait, fix input, or clean up by hand.
//! Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for Jiraform operations
pub type Result<T> = std::result::Result<T, JiraformError>;

/// Comprehensive error type for Jiraform operations
#[derive(Error, Debug)]
pub enum JiraformError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Errors from the REST client (HTTP status, rate limit, transport)
    #[error(transparent)]
    Api(#[from] jira_rest::Error),

    /// A by-id lookup found nothing
    #[error("{kind} with id '{id}' not found")]
    NotFoundById { kind: String, id: String },

    /// A by-name lookup found nothing
    #[error("{kind} named '{name}' not found")]
    NotFoundByName { kind: String, name: String },

    /// Name matches exist but every one is project-scoped
    #[error(
        "No global (classic) {kind} named '{name}' found; {candidates} match(es) exist but \
         only project-scoped (next-gen/team-managed) ones"
    )]
    NoEligibleMatch {
        kind: String,
        name: String,
        candidates: usize,
    },

    /// Both or neither of two mutually exclusive inputs were given
    #[error("Ambiguous input: {0}")]
    AmbiguousInput(String),

    /// The engine was invoked in a way the resource kind forbids
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Desired attributes are missing or malformed
    #[error("Invalid {kind} attributes: {message}")]
    InvalidAttributes { kind: String, message: String },

    /// Global-only references point at project-scoped entities
    #[error(
        "Issue type IDs {} are project-scoped (next-gen/team-managed); {kind} only accepts \
         global (classic) issue types",
        .ids.join(", ")
    )]
    ScopedReference { kind: String, ids: Vec<String> },

    /// One step of a multi-call update failed; later steps were not attempted
    #[error(
        "{kind} update failed at step '{step}' (completed: {}): {source}",
        describe_steps(.completed)
    )]
    UpdateFailed {
        kind: String,
        step: String,
        completed: Vec<String>,
        #[source]
        source: Box<JiraformError>,
    },

    /// A multi-step operation left remote side effects behind before failing
    #[error("{kind} partially applied: {message}: {source}")]
    PartialFailure {
        kind: String,
        message: String,
        remote_id: Option<String>,
        #[source]
        source: Box<JiraformError>,
    },
}

fn describe_steps(steps: &[String]) -> String {
    if steps.is_empty() {
        "none".to_string()
    } else {
        steps.join(", ")
    }
}

/// Operator-facing classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// HTTP 429 that outlasted the retry budget (or had no usable Retry-After)
    RateLimited,
    /// The requested remote entity does not exist
    NotFound,
    /// The server or a local check rejected the input on its merits
    Validation,
    /// Mutually exclusive inputs were both or neither given
    AmbiguousInput,
    /// Programming or configuration error in how the engine was driven
    ContractViolation,
    /// Some remote side effects already happened
    PartialFailure,
    /// Network, TLS, timeout or 5xx failures
    Transport,
    /// Local files and configuration
    Config,
}

impl JiraformError {
    /// Classify the error, looking through update-step wrappers
    pub fn class(&self) -> ErrorClass {
        match self {
            JiraformError::Api(e) => {
                if e.is_rate_limited() {
                    ErrorClass::RateLimited
                } else if e.is_not_found() {
                    ErrorClass::NotFound
                } else if e.is_validation() {
                    ErrorClass::Validation
                } else {
                    ErrorClass::Transport
                }
            }
            JiraformError::NotFoundById { .. }
            | JiraformError::NotFoundByName { .. }
            | JiraformError::NoEligibleMatch { .. } => ErrorClass::NotFound,
            JiraformError::AmbiguousInput(_) => ErrorClass::AmbiguousInput,
            JiraformError::ContractViolation(_) => ErrorClass::ContractViolation,
            JiraformError::InvalidAttributes { .. } | JiraformError::ScopedReference { .. } => {
                ErrorClass::Validation
            }
            JiraformError::UpdateFailed { source, .. } => source.class(),
            JiraformError::PartialFailure { .. } => ErrorClass::PartialFailure,
            JiraformError::Config(_)
            | JiraformError::Io(_)
            | JiraformError::Json(_)
            | JiraformError::Yaml(_) => ErrorClass::Config,
        }
    }

    /// True iff the underlying API call returned HTTP 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, JiraformError::Api(e) if jira_rest::is_not_found(e))
    }

    pub(crate) fn invalid(kind: impl Into<String>, message: impl Into<String>) -> Self {
        JiraformError::InvalidAttributes {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorClass::RateLimited => "rate-limited",
            ErrorClass::NotFound => "not-found",
            ErrorClass::Validation => "validation",
            ErrorClass::AmbiguousInput => "ambiguous-input",
            ErrorClass::ContractViolation => "contract-violation",
            ErrorClass::PartialFailure => "partial-failure",
            ErrorClass::Transport => "transport",
            ErrorClass::Config => "config",
        };
        f.write_str(label)
    }
}
