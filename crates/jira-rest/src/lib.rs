//! Resilient client for the Jira Cloud REST API
//!
//! Authenticated JSON requests with structured error classification and
//! bounded rate-limit back-pressure.
//!
//! # Example
//!
//! ```no_run
//! use jira_rest::{ApiRequest, Credentials, JiraClient};
//! use std::time::Duration;
//!
//! # async fn run() -> jira_rest::Result<()> {
//! let credentials = Credentials::new(
//!     "https://example.atlassian.net",
//!     "admin@example.com",
//!     "api-token",
//! );
//! let client = JiraClient::connect(credentials, Duration::from_secs(30))?;
//!
//! // Single object
//! let project: serde_json::Value = client
//!     .fetch(&ApiRequest::get("/rest/api/3/project/10000"))
//!     .await?;
//!
//! // Every page of a paged listing
//! let groups: Vec<serde_json::Value> = client
//!     .fetch_all_pages(&ApiRequest::get("/rest/api/3/group/bulk"))
//!     .await?;
//!
//! println!("{} has {} groups", project["name"], groups.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod paging;
pub mod retry;
pub mod transport;

pub use client::JiraClient;
pub use error::{is_not_found, ApiError, Error, Result};
pub use paging::{Page, PAGE_SIZE};
pub use retry::RetryConfig;
pub use reqwest::Method;
pub use transport::{
    encode_segment, ApiRequest, Credentials, HttpTransport, RawResponse, Transport,
    DEFAULT_TIMEOUT,
};
