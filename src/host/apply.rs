//! Applying plans
//!
//! Instances are reconciled one at a time in plan order. A failing instance
//! is recorded in the report and the run moves on; the state file is
//! rewritten after every instance.

use super::manifest::Address;
use super::plan::{Action, Plan, PlannedChange};
use super::state::State;
use crate::error::{ErrorClass, JiraformError, Result};
use crate::reconciler::{Applied, Attributes, InstanceRecord, Reconciler, ResourceKind};
use jira_rest::JiraClient;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Applied,
    Unchanged,
    Deleted,
    /// Remote entity is gone; its state entry was dropped
    Absent,
    Failed { class: ErrorClass, message: String },
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Applied => f.write_str("applied"),
            Status::Unchanged => f.write_str("unchanged"),
            Status::Deleted => f.write_str("deleted"),
            Status::Absent => f.write_str("absent, removed from state"),
            Status::Failed { class, message } => write!(f, "failed [{}]: {}", class, message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub address: Address,
    pub status: Status,
    pub warnings: Vec<String>,
}

impl Outcome {
    fn new(address: Address, status: Status) -> Self {
        Self {
            address,
            status,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub outcomes: Vec<Outcome>,
}

impl ApplyReport {
    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, Status::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            out.push_str(&format!("{}: {}\n", outcome.address, outcome.status));
            for warning in &outcome.warnings {
                out.push_str(&format!("  warning: {}\n", warning));
            }
        }
        out
    }
}

/// Drives the reconciler for a set of instances against one state file
pub struct Applier {
    client: JiraClient,
    state_path: PathBuf,
}

impl Applier {
    pub fn new(client: JiraClient, state_path: impl Into<PathBuf>) -> Self {
        Self {
            client,
            state_path: state_path.into(),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    fn reconciler(&self, kind: ResourceKind) -> Reconciler {
        Reconciler::new(kind, self.client.clone())
    }

    /// Re-read every instance in state; entries whose remote entity is gone are dropped
    pub async fn refresh(&self, state: &mut State) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();
        let addresses: Vec<Address> = state.instances.keys().cloned().collect();

        for address in addresses {
            let Some(record) = state.get(&address).cloned() else {
                continue;
            };
            if record.id.is_empty() {
                continue;
            }

            let status = match self
                .reconciler(address.kind)
                .read(&record.id, &addressing_attributes(&record))
                .await
            {
                Ok(Some(observed)) => {
                    let mut updated = record;
                    updated.id = observed.id;
                    updated.observed = observed.attributes;
                    state.insert(address.clone(), updated);
                    Status::Unchanged
                }
                Ok(None) => {
                    warn!(address = %address, "Instance no longer exists remotely");
                    state.remove(&address);
                    Status::Absent
                }
                Err(e) => failed(&address, e),
            };

            state.save(&self.state_path)?;
            report.outcomes.push(Outcome::new(address, status));
        }

        Ok(report)
    }

    /// Carry out every change in `plan`, updating `state` as results arrive
    pub async fn apply(&self, plan: &Plan, state: &mut State) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();

        for change in &plan.changes {
            let outcome = match &change.action {
                Action::NoOp => Outcome::new(change.address.clone(), Status::Unchanged),
                Action::Create => self.create(change, state).await,
                Action::Update { .. } => self.update(change, state).await,
                Action::Replace { .. } => self.replace(change, state).await,
                Action::Delete => self.delete(&change.address, state).await,
            };

            if change.action.is_change() {
                state.save(&self.state_path)?;
            }
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    /// Adopt an existing remote entity under `address`
    pub async fn import(&self, address: &Address, import_id: &str, state: &mut State) -> Result<Applied> {
        if state.get(address).is_some() {
            return Err(JiraformError::Config(format!(
                "{} is already managed; remove it from state before importing",
                address
            )));
        }

        let applied = self.reconciler(address.kind).import(import_id).await?;
        state.insert(
            address.clone(),
            InstanceRecord {
                kind: address.kind,
                id: applied.id.clone(),
                applied: applied.observed.clone(),
                observed: applied.observed.clone(),
            },
        );
        state.save(&self.state_path)?;
        info!(address = %address, id = %applied.id, "Imported");
        Ok(applied)
    }

    async fn create(&self, change: &PlannedChange, state: &mut State) -> Outcome {
        let address = change.address.clone();
        let desired = change.desired.clone().unwrap_or_default();
        info!(address = %address, "Creating instance");

        match self.reconciler(address.kind).create(&desired).await {
            Ok(applied) => record_applied(state, &address, desired, applied),
            Err(e) => {
                // The entity exists remotely; keep its id so a refresh can pick it up
                if let JiraformError::PartialFailure {
                    remote_id: Some(id),
                    ..
                } = &e
                {
                    let mut record = InstanceRecord::new(address.kind);
                    record.id = id.clone();
                    record.applied = desired;
                    state.insert(address.clone(), record);
                }
                Outcome::new(address.clone(), failed(&address, e))
            }
        }
    }

    async fn update(&self, change: &PlannedChange, state: &mut State) -> Outcome {
        let address = change.address.clone();
        let desired = change.desired.clone().unwrap_or_default();
        let Some(record) = state.get(&address).cloned() else {
            return self.create(change, state).await;
        };
        info!(address = %address, id = %record.id, "Updating instance");

        match self
            .reconciler(address.kind)
            .update(&record.id, &desired, &record.observed)
            .await
        {
            Ok(applied) => record_applied(state, &address, desired, applied),
            Err(e) => {
                // A rename that deleted the old entity but failed to create
                // the new one leaves nothing to track
                if matches!(e, JiraformError::PartialFailure { remote_id: None, .. }) {
                    state.remove(&address);
                }
                Outcome::new(address.clone(), failed(&address, e))
            }
        }
    }

    async fn replace(&self, change: &PlannedChange, state: &mut State) -> Outcome {
        let deleted = self.delete(&change.address, state).await;
        if deleted.status != Status::Deleted {
            return deleted;
        }
        self.create(change, state).await
    }

    async fn delete(&self, address: &Address, state: &mut State) -> Outcome {
        let Some(record) = state.get(address).cloned() else {
            return Outcome::new(address.clone(), Status::Deleted);
        };
        if record.id.is_empty() {
            state.remove(address);
            return Outcome::new(address.clone(), Status::Deleted);
        }
        info!(address = %address, id = %record.id, "Deleting instance");

        match self
            .reconciler(address.kind)
            .delete(&record.id, &addressing_attributes(&record))
            .await
        {
            Ok(()) => {
                state.remove(address);
                Outcome::new(address.clone(), Status::Deleted)
            }
            Err(e) => Outcome::new(address.clone(), failed(address, e)),
        }
    }
}

/// Observed attributes over applied ones, for deriving natural and composite keys
fn addressing_attributes(record: &InstanceRecord) -> Attributes {
    let mut attributes = record.applied.clone();
    attributes.extend(record.observed.clone());
    attributes
}

fn record_applied(state: &mut State, address: &Address, desired: Attributes, applied: Applied) -> Outcome {
    for warning in &applied.warnings {
        warn!(address = %address, warning = %warning, "Applied with warnings");
    }
    state.insert(
        address.clone(),
        InstanceRecord {
            kind: address.kind,
            id: applied.id,
            applied: desired,
            observed: applied.observed,
        },
    );
    Outcome {
        address: address.clone(),
        status: Status::Applied,
        warnings: applied.warnings,
    }
}

fn failed(address: &Address, error: JiraformError) -> Status {
    warn!(address = %address, error = %error, "Instance failed");
    Status::Failed {
        class: error.class(),
        message: error.to_string(),
    }
}
