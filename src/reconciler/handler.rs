//! Per-kind handler trait
//!
//! A handler knows how one resource kind maps onto the Jira API: request
//! bodies, response shapes and update steps. Sequencing, error
//! classification and delete-mode dispatch belong to the engine.

use super::descriptor::{InstanceKey, ResourceKind};
use super::record::Attributes;
use crate::error::{JiraformError, Result};
use async_trait::async_trait;
use jira_rest::ApiRequest;
use serde_json::Value;

/// Remote state of one instance as returned by a read
#[derive(Debug, Clone, PartialEq)]
pub struct Observed {
    pub id: String,
    pub attributes: Attributes,
}

/// One independent call within an update
#[derive(Debug, Clone)]
pub struct UpdateStep {
    /// Operator-facing label, e.g. "permission scheme assignment"
    pub name: String,
    pub request: ApiRequest,
}

impl UpdateStep {
    pub fn new(name: impl Into<String>, request: ApiRequest) -> Self {
        Self {
            name: name.into(),
            request,
        }
    }
}

#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Build the create call; may validate references first (read-only)
    async fn create_request(&self, desired: &Attributes) -> Result<ApiRequest>;

    /// Follow-up call for kinds created in an inactive state
    fn activation_step(&self, _id: &str, _desired: &Attributes) -> Result<Option<UpdateStep>> {
        Ok(None)
    }

    /// Fetch current remote state; `Ok(None)` when the instance is gone.
    /// A 404 error is also treated as gone by the engine.
    async fn read(&self, key: &InstanceKey) -> Result<Option<Observed>>;

    /// Ordered calls that move `observed` to `desired`; may be empty
    async fn update_steps(
        &self,
        id: &str,
        desired: &Attributes,
        observed: &Attributes,
    ) -> Result<Vec<UpdateStep>>;

    fn delete_request(&self, key: &InstanceKey) -> Result<ApiRequest>;

    /// State flip used instead of delete by `Disable` kinds
    fn disable_request(&self, _key: &InstanceKey) -> Result<ApiRequest> {
        Err(JiraformError::ContractViolation(format!(
            "{} does not support disabling",
            self.kind()
        )))
    }
}

/// New id from a create response: the first of `fields` present wins
pub fn extract_created_id(response: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| response.get(*field))
        .find_map(crate::resolver::value_as_id)
}

/// Require that a key has the variant a handler expects
pub fn expect_id(kind: ResourceKind, key: &InstanceKey) -> Result<String> {
    match key {
        InstanceKey::Id(id) => Ok(id.clone()),
        other => Err(JiraformError::ContractViolation(format!(
            "{} is addressed by id, got key '{}'",
            kind, other
        ))),
    }
}
