//! Resource reconciliation
//!
//! [`Reconciler`] runs the create/read/update/delete lifecycle for one
//! instance of one kind. Kind-specific request shapes come from the
//! [`ResourceHandler`] in [`kinds`]; everything that differs between kinds
//! in *policy* comes from the kind's [`ResourceDescriptor`].
//!
//! The observed half of every result is produced by a fresh read after the
//! mutation, never patched from the request that was sent.

pub mod descriptor;
pub mod handler;
pub mod kinds;
pub mod record;

pub use descriptor::{
    DeleteMode, IdentityMode, InstanceKey, ResourceDescriptor, ResourceKind, DESCRIPTORS,
};
pub use handler::{Observed, ResourceHandler, UpdateStep};
pub use record::{decode_attributes, encode_attributes, AttrValue, Attributes, InstanceRecord};

use crate::error::{JiraformError, Result};
use handler::extract_created_id;
use jira_rest::JiraClient;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Outcome of a create, update or import
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub id: String,
    pub observed: Attributes,
    /// Non-fatal divergences the operator should see
    pub warnings: Vec<String>,
}

/// Lifecycle engine for one resource kind
pub struct Reconciler {
    client: JiraClient,
    handler: Box<dyn ResourceHandler>,
}

impl Reconciler {
    pub fn new(kind: ResourceKind, client: JiraClient) -> Self {
        let handler = kinds::handler_for(kind, client.clone());
        Self { client, handler }
    }

    pub fn kind(&self) -> ResourceKind {
        self.handler.kind()
    }

    pub fn descriptor(&self) -> &'static ResourceDescriptor {
        self.kind().descriptor()
    }

    /// Create the remote entity, run any activation step, then read it back
    pub async fn create(&self, desired: &Attributes) -> Result<Applied> {
        let kind = self.kind();
        let descriptor = self.descriptor();
        info!(kind = %kind, "Creating");

        let request = self.handler.create_request(desired).await?;
        let response: Option<Value> = self.client.fetch_optional(&request).await?;

        let id = self.created_id(desired, response.as_ref())?;
        debug!(kind = %kind, id = %id, "Created");

        let mut warnings = Vec::new();
        if let Some(step) = self.handler.activation_step(&id, desired)? {
            if let Err(e) = self.client.dispatch(&step.request).await {
                warn!(
                    kind = %kind,
                    id = %id,
                    step = %step.name,
                    error = %e,
                    "Created but activation failed; remote state differs from desired"
                );
                warnings.push(format!(
                    "{} {} was created but '{}' failed: {}",
                    kind, id, step.name, e
                ));
            }
        }

        let key = descriptor.instance_key(&id, desired)?;
        match self.read_key(&key).await {
            Ok(Some(observed)) => Ok(Applied {
                id: observed.id,
                observed: observed.attributes,
                warnings,
            }),
            Ok(None) => Err(JiraformError::PartialFailure {
                kind: kind.to_string(),
                message: format!("created {} but it could not be read back", id),
                remote_id: Some(id.clone()),
                source: Box::new(JiraformError::NotFoundById {
                    kind: kind.to_string(),
                    id,
                }),
            }),
            Err(e) => Err(JiraformError::PartialFailure {
                kind: kind.to_string(),
                message: format!("created {} but reading it back failed", id),
                remote_id: Some(id),
                source: Box::new(e),
            }),
        }
    }

    /// Current remote state; `None` means the instance no longer exists
    pub async fn read(&self, id: &str, attributes: &Attributes) -> Result<Option<Observed>> {
        let key = self.descriptor().instance_key(id, attributes)?;
        self.read_key(&key).await
    }

    /// Adopt an existing remote entity
    pub async fn import(&self, import_id: &str) -> Result<Applied> {
        let kind = self.kind();
        let key = self.descriptor().parse_import_id(import_id)?;
        info!(kind = %kind, key = %key, "Importing");

        match self.read_key(&key).await? {
            Some(observed) => Ok(Applied {
                id: observed.id,
                observed: observed.attributes,
                warnings: Vec::new(),
            }),
            None => Err(JiraformError::NotFoundById {
                kind: kind.to_string(),
                id: key.as_id(),
            }),
        }
    }

    /// Move the remote entity from `observed` to `desired`.
    ///
    /// Composite-key kinds and immutable field changes are contract
    /// violations: the host must replace the instance instead.
    pub async fn update(
        &self,
        id: &str,
        desired: &Attributes,
        observed: &Attributes,
    ) -> Result<Applied> {
        let kind = self.kind();
        let descriptor = self.descriptor();

        if descriptor.is_composite() {
            return Err(JiraformError::ContractViolation(format!(
                "{} instances cannot be updated in place; replace them",
                kind
            )));
        }

        let changed = descriptor.changed_immutable_fields(desired, observed);
        if !changed.is_empty() {
            return Err(JiraformError::ContractViolation(format!(
                "{} field(s) {} cannot change in place; replace the instance",
                kind,
                changed.join(", ")
            )));
        }

        if descriptor.delete_mode == DeleteMode::DeleteAndRecreateOnRename {
            if let Some(field) = descriptor.natural_key_field() {
                if desired.get(field) != observed.get(field) {
                    return self.rename(id, desired, observed).await;
                }
            }
        }

        let steps = self.handler.update_steps(id, desired, observed).await?;
        info!(kind = %kind, id = %id, steps = steps.len(), "Updating");

        let mut completed: Vec<String> = Vec::new();
        for step in steps {
            if let Err(e) = self.client.dispatch(&step.request).await {
                return Err(JiraformError::UpdateFailed {
                    kind: kind.to_string(),
                    step: step.name,
                    completed,
                    source: Box::new(e.into()),
                });
            }
            debug!(kind = %kind, id = %id, step = %step.name, "Update step applied");
            completed.push(step.name);
        }

        match self.read(id, desired).await? {
            Some(observed) => Ok(Applied {
                id: observed.id,
                observed: observed.attributes,
                warnings: Vec::new(),
            }),
            None => Err(JiraformError::PartialFailure {
                kind: kind.to_string(),
                message: format!("{} disappeared during update", id),
                remote_id: Some(id.to_string()),
                source: Box::new(JiraformError::NotFoundById {
                    kind: kind.to_string(),
                    id: id.to_string(),
                }),
            }),
        }
    }

    /// Stop managing the instance, per the kind's delete mode
    pub async fn delete(&self, id: &str, attributes: &Attributes) -> Result<()> {
        let kind = self.kind();
        let key = self.descriptor().instance_key(id, attributes)?;

        let request = match self.descriptor().delete_mode {
            DeleteMode::Disable => {
                warn!(
                    kind = %kind,
                    key = %key,
                    "Jira does not support deleting this kind; disabling instead"
                );
                self.handler.disable_request(&key)?
            }
            DeleteMode::HardDelete | DeleteMode::DeleteAndRecreateOnRename => {
                info!(kind = %kind, key = %key, "Deleting");
                self.handler.delete_request(&key)?
            }
        };

        self.client.dispatch(&request).await?;
        Ok(())
    }

    async fn rename(&self, id: &str, desired: &Attributes, observed: &Attributes) -> Result<Applied> {
        let kind = self.kind();
        let old_key = self.descriptor().instance_key(id, observed)?;
        info!(kind = %kind, old = %old_key, "Renaming via delete and recreate");

        let request = self.handler.delete_request(&old_key)?;
        self.client.dispatch(&request).await?;

        self.create(desired)
            .await
            .map_err(|e| JiraformError::PartialFailure {
                kind: kind.to_string(),
                message: format!(
                    "old instance removed, new instance failed (deleted '{}')",
                    old_key
                ),
                remote_id: None,
                source: Box::new(e),
            })
    }

    async fn read_key(&self, key: &InstanceKey) -> Result<Option<Observed>> {
        match self.handler.read(key).await {
            Ok(observed) => Ok(observed),
            Err(e) if e.is_not_found() => {
                debug!(kind = %self.kind(), key = %key, "Instance no longer exists");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn created_id(&self, desired: &Attributes, response: Option<&Value>) -> Result<String> {
        let descriptor = self.descriptor();

        if descriptor.is_composite() {
            return descriptor.instance_key("", desired).map(|key| key.as_id());
        }

        if let Some(id) = response.and_then(|r| extract_created_id(r, descriptor.created_id_fields)) {
            return Ok(id);
        }

        match descriptor.natural_key_field() {
            Some(_) => descriptor.instance_key("", desired).map(|key| key.as_id()),
            None => Err(JiraformError::PartialFailure {
                kind: self.kind().to_string(),
                message: "created, but the response carried no id".to_string(),
                remote_id: None,
                source: Box::new(JiraformError::ContractViolation(format!(
                    "none of {} present in create response",
                    descriptor.created_id_fields.join(", ")
                ))),
            }),
        }
    }
}
