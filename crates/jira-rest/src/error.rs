//! Error types for Jira REST calls
//!
//! Every non-2xx response becomes an [`ApiError`] that keeps the numeric
//! status, so callers classify failures with [`is_not_found`] instead of
//! inspecting HTTP details themselves.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for Jira REST operations
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error decoded from a non-2xx Jira response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: u16,
    messages: Vec<String>,
    field_errors: BTreeMap<String, String>,
    raw_body: Option<String>,
}

/// Jira's error body: `{"errorMessages": [...], "errors": {field: message}}`
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(rename = "errorMessages", default)]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: BTreeMap<String, serde_json::Value>,
}

impl ApiError {
    /// Build an error from a response status and body.
    ///
    /// Returns `None` for 2xx statuses: a success response never produces an
    /// `ApiError`. When the body carries neither `errorMessages` nor `errors`
    /// the trimmed raw body text is kept as the error detail instead.
    pub fn from_response(status: u16, body: &str) -> Option<Self> {
        if (200..300).contains(&status) {
            return None;
        }

        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let messages: Vec<String> = parsed
            .error_messages
            .into_iter()
            .filter(|m| !m.trim().is_empty())
            .collect();
        let field_errors: BTreeMap<String, String> = parsed
            .errors
            .into_iter()
            .map(|(field, value)| {
                let message = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (field, message)
            })
            .collect();

        let raw_body = if messages.is_empty() && field_errors.is_empty() {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        } else {
            None
        };

        Some(Self {
            status,
            messages,
            field_errors,
            raw_body,
        })
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    /// Raw body text, only kept when no structured message could be decoded
    pub fn raw_body(&self) -> Option<&str> {
        self.raw_body.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JIRA API error (HTTP {})", self.status)?;

        let mut details: Vec<String> = self.messages.clone();
        details.extend(
            self.field_errors
                .iter()
                .map(|(field, message)| format!("{}: {}", field, message)),
        );

        if !details.is_empty() {
            write!(f, ": {}", details.join("; "))
        } else if let Some(raw) = &self.raw_body {
            write!(f, ": {}", raw)
        } else {
            Ok(())
        }
    }
}

impl std::error::Error for ApiError {}

/// Errors returned by [`crate::JiraClient`]
#[derive(Error, Debug)]
pub enum Error {
    /// Non-2xx response other than a rate limit
    #[error(transparent)]
    Api(#[from] ApiError),

    /// HTTP 429 without a usable Retry-After header
    #[error("rate limited by JIRA API, retry after: {}", header.as_deref().unwrap_or("unspecified"))]
    RateLimited { header: Option<String> },

    /// HTTP 429 kept coming back after the retry budget was spent
    #[error("rate limited by JIRA API; gave up after {attempts} waits")]
    RateLimitExhausted { attempts: u32, last_wait: Duration },

    /// Connection, TLS or timeout failures
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request body could not be serialized
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// 2xx response body did not match the expected shape
    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// 2xx response with no body where one was required
    #[error("empty response body from {path}")]
    EmptyBody { path: String },

    /// A paged listing was still unfinished after the page bound
    #[error("paged listing {path} did not end after {pages} pages")]
    PageLimit { path: String, pages: usize },
}

impl Error {
    /// True iff the error carries HTTP 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(api) if api.is_not_found())
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status()),
            Error::RateLimited { .. } | Error::RateLimitExhausted { .. } => Some(429),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Error::RateLimited { .. } | Error::RateLimitExhausted { .. }
        )
    }

    /// Any other 4xx: a request the server rejected on its merits
    pub fn is_validation(&self) -> bool {
        match self {
            Error::Api(api) => {
                (400..500).contains(&api.status()) && !matches!(api.status(), 404 | 429)
            }
            _ => false,
        }
    }
}

impl crate::retry::RetryableError for Error {
    fn retry_decision(&self) -> crate::retry::RetryDecision {
        use crate::retry::RetryDecision;

        match self {
            // Only an integer Retry-After is honored
            Error::RateLimited { header: Some(h) } => match h.trim().parse::<u64>() {
                Ok(secs) => RetryDecision::RetryAfter(Duration::from_secs(secs)),
                Err(_) => RetryDecision::NoRetry,
            },
            _ => RetryDecision::NoRetry,
        }
    }

    fn exhausted(self, attempts: u32, last_wait: Duration) -> Self {
        match self {
            Error::RateLimited { .. } => Error::RateLimitExhausted {
                attempts,
                last_wait,
            },
            other => other,
        }
    }
}

/// The single not-found check the rest of the system relies on
pub fn is_not_found(error: &Error) -> bool {
    error.is_not_found()
}
