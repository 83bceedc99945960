//! Jira REST client
//!
//! Wraps a [`Transport`] with authentication-agnostic request execution,
//! rate-limit retry, status classification and JSON decoding.

use crate::error::{ApiError, Error, Result};
use crate::retry::{with_retry, RetryConfig};
use crate::transport::{ApiRequest, Credentials, HttpTransport, Transport};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Shared, cheaply cloneable Jira client
#[derive(Clone)]
pub struct JiraClient {
    transport: Arc<dyn Transport>,
    retry: RetryConfig,
}

impl JiraClient {
    /// Client over an arbitrary transport with the default retry budget
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry: RetryConfig::default(),
        }
    }

    /// Client over HTTPS with HTTP Basic authentication
    pub fn connect(credentials: Credentials, timeout: Duration) -> Result<Self> {
        let transport = HttpTransport::with_timeout(credentials, timeout)?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Execute a request and return the raw 2xx body.
    ///
    /// A 429 with an integer `Retry-After` is waited out and the identical
    /// request re-sent, within the retry budget.
    pub async fn execute(&self, request: &ApiRequest) -> Result<String> {
        let operation = request.to_string();
        with_retry(&self.retry, &operation, || self.execute_once(request)).await
    }

    async fn execute_once(&self, request: &ApiRequest) -> Result<String> {
        let response = self.transport.send(request).await?;

        if response.status == 429 {
            return Err(Error::RateLimited {
                header: response.retry_after,
            });
        }

        if let Some(api_error) = ApiError::from_response(response.status, &response.body) {
            debug!(
                request = %request,
                status = response.status,
                "JIRA request failed"
            );
            return Err(Error::Api(api_error));
        }

        Ok(response.body)
    }

    /// Execute and decode the JSON body into `T`; an empty body is an error
    pub async fn fetch<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let body = self.execute(request).await?;
        if body.trim().is_empty() {
            return Err(Error::EmptyBody {
                path: request.path.clone(),
            });
        }
        decode(&request.path, &body)
    }

    /// Execute and decode the JSON body if there is one
    pub async fn fetch_optional<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Option<T>> {
        let body = self.execute(request).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        decode(&request.path, &body).map(Some)
    }

    /// Execute and return the body as an untyped JSON value
    pub async fn fetch_value(&self, request: &ApiRequest) -> Result<Value> {
        self.fetch(request).await
    }

    /// Execute for the side effect only; any body is ignored
    pub async fn dispatch(&self, request: &ApiRequest) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| Error::Decode {
        path: path.to_string(),
        source,
    })
}
