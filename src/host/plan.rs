//! Planning
//!
//! Compares the manifest against the state file and decides, per address,
//! what the applier has to do. Planning makes no API calls; run a refresh
//! first to plan against current remote state.

use super::manifest::{Address, Manifest};
use super::state::State;
use crate::reconciler::{Attributes, InstanceRecord, ResourceDescriptor};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create,
    NoOp,
    Update { fields: Vec<String> },
    /// Delete then create; the listed fields cannot change in place
    Replace { fields: Vec<String> },
    Delete,
}

impl Action {
    pub fn symbol(&self) -> &'static str {
        match self {
            Action::Create => "+",
            Action::NoOp => " ",
            Action::Update { .. } => "~",
            Action::Replace { .. } => "-/+",
            Action::Delete => "-",
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, Action::NoOp)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => f.write_str("create"),
            Action::NoOp => f.write_str("no changes"),
            Action::Update { fields } => write!(f, "update ({})", fields.join(", ")),
            Action::Replace { fields } => write!(f, "replace ({})", fields.join(", ")),
            Action::Delete => f.write_str("delete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub address: Address,
    pub action: Action,
    /// Manifest attributes; `None` for deletes
    pub desired: Option<Attributes>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub changes: Vec<PlannedChange>,
}

impl Plan {
    /// Manifest order first, then deletes in reverse state order
    pub fn build(manifest: &Manifest, state: &State) -> Self {
        let mut changes = Vec::new();

        for spec in &manifest.resources {
            let address = spec.address();
            let action = match state.get(&address) {
                Some(record) if !record.id.is_empty() => {
                    diff(spec.kind.descriptor(), &spec.attributes, record)
                }
                _ => Action::Create,
            };
            changes.push(PlannedChange {
                address,
                action,
                desired: Some(spec.attributes.clone()),
            });
        }

        for address in state.instances.keys().rev() {
            if manifest.get(address).is_none() {
                changes.push(PlannedChange {
                    address: address.clone(),
                    action: Action::Delete,
                    desired: None,
                });
            }
        }

        Plan { changes }
    }

    /// Delete everything in the state, newest address last in, first out
    pub fn destroy(state: &State) -> Self {
        let changes = state
            .instances
            .keys()
            .rev()
            .map(|address| PlannedChange {
                address: address.clone(),
                action: Action::Delete,
                desired: None,
            })
            .collect();
        Plan { changes }
    }

    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| c.action.is_change())
    }

    pub fn count(&self, predicate: impl Fn(&Action) -> bool) -> usize {
        self.changes.iter().filter(|c| predicate(&c.action)).count()
    }

    /// Human-readable listing, one change per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        for change in self.changes.iter().filter(|c| c.action.is_change()) {
            out.push_str(&format!(
                "{:>3} {}: {}\n",
                change.action.symbol(),
                change.address,
                change.action
            ));
        }
        out.push_str(&format!(
            "Plan: {} to create, {} to update, {} to replace, {} to delete.\n",
            self.count(|a| matches!(a, Action::Create)),
            self.count(|a| matches!(a, Action::Update { .. })),
            self.count(|a| matches!(a, Action::Replace { .. })),
            self.count(|a| matches!(a, Action::Delete)),
        ));
        out
    }
}

/// Decide the action for an instance that exists in state.
///
/// Write-only fields compare against the last applied value, every other
/// field against the last observed one. Set fields ignore order. A field
/// dropped from the manifest counts as changed when it was applied before.
fn diff(descriptor: &ResourceDescriptor, desired: &Attributes, record: &InstanceRecord) -> Action {
    let mut changed = BTreeSet::new();

    for (field, want) in desired {
        let baseline = if descriptor.is_write_only(field) {
            &record.applied
        } else {
            &record.observed
        };
        let same = baseline
            .get(field)
            .is_some_and(|have| descriptor.same_value(field, want, have));
        if !same {
            changed.insert(field.clone());
        }
    }
    for field in record.applied.keys() {
        if !desired.contains_key(field) && record.observed.contains_key(field) {
            changed.insert(field.clone());
        }
    }

    if changed.is_empty() {
        return Action::NoOp;
    }

    let mut forcing: Vec<String> = descriptor
        .changed_immutable_fields(desired, &record.observed)
        .into_iter()
        .map(str::to_string)
        .collect();
    if descriptor.is_composite() {
        forcing = changed.iter().cloned().collect();
    }

    if forcing.is_empty() {
        Action::Update {
            fields: changed.into_iter().collect(),
        }
    } else {
        Action::Replace { fields: forcing }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::record::attrs;
    use crate::reconciler::{AttrValue, ResourceKind};

    fn manifest(yaml: &str) -> Manifest {
        Manifest::parse(yaml).unwrap()
    }

    fn record(kind: ResourceKind, id: &str, applied: Attributes, observed: Attributes) -> InstanceRecord {
        InstanceRecord {
            kind,
            id: id.to_string(),
            applied,
            observed,
        }
    }

    #[test]
    fn test_create_when_not_in_state() {
        let plan = Plan::build(
            &manifest("resources:\n  - {kind: group, name: admins, attributes: {name: ops}}\n"),
            &State::default(),
        );
        assert_eq!(plan.changes[0].action, Action::Create);
        assert!(plan.has_changes());
    }

    #[test]
    fn test_noop_and_update() {
        let mut state = State::default();
        state.insert(
            Address::new(ResourceKind::ProjectComponent, "backend"),
            record(
                ResourceKind::ProjectComponent,
                "10050",
                attrs(&[("project_key", "OPS"), ("name", "Backend")]),
                attrs(&[("project_key", "OPS"), ("name", "Backend")]),
            ),
        );

        let same = Plan::build(
            &manifest("resources:\n  - {kind: project_component, name: backend, attributes: {project_key: OPS, name: Backend}}\n"),
            &state,
        );
        assert_eq!(same.changes[0].action, Action::NoOp);
        assert!(!same.has_changes());

        let renamed = Plan::build(
            &manifest("resources:\n  - {kind: project_component, name: backend, attributes: {project_key: OPS, name: API}}\n"),
            &state,
        );
        assert_eq!(
            renamed.changes[0].action,
            Action::Update {
                fields: vec!["name".to_string()]
            }
        );
    }

    #[test]
    fn test_immutable_change_is_replace() {
        let mut state = State::default();
        state.insert(
            Address::new(ResourceKind::IssueType, "incident"),
            record(
                ResourceKind::IssueType,
                "10030",
                attrs(&[("name", "Incident"), ("type", "standard")]),
                attrs(&[("name", "Incident"), ("type", "standard")]),
            ),
        );
        let plan = Plan::build(
            &manifest("resources:\n  - {kind: issue_type, name: incident, attributes: {name: Incident, type: subtask}}\n"),
            &state,
        );
        assert_eq!(
            plan.changes[0].action,
            Action::Replace {
                fields: vec!["type".to_string()]
            }
        );
    }

    #[test]
    fn test_write_only_compares_against_applied() {
        let rule = r#"{"trigger":{}}"#;
        let mut state = State::default();
        state.insert(
            Address::new(ResourceKind::AutomationRule, "stale"),
            record(
                ResourceKind::AutomationRule,
                "42",
                attrs(&[("name", "Stale"), ("rule_json", rule)]),
                attrs(&[("name", "Stale"), ("state", "ENABLED")]),
            ),
        );

        let unchanged = format!(
            "resources:\n  - kind: automation_rule\n    name: stale\n    attributes:\n      name: Stale\n      rule_json: '{}'\n",
            rule
        );
        assert_eq!(Plan::build(&manifest(&unchanged), &state).changes[0].action, Action::NoOp);

        let edited = unchanged.replace("{}}", "{\"x\":1}}");
        assert_eq!(
            Plan::build(&manifest(&edited), &state).changes[0].action,
            Action::Update {
                fields: vec!["rule_json".to_string()]
            }
        );
    }

    #[test]
    fn test_removed_from_manifest_is_delete() {
        let mut state = State::default();
        state.insert(
            Address::new(ResourceKind::Group, "admins"),
            record(ResourceKind::Group, "a1", attrs(&[("name", "ops")]), attrs(&[("name", "ops")])),
        );
        let plan = Plan::build(&Manifest::default(), &state);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].action, Action::Delete);
        assert!(plan.render().contains("Plan: 0 to create, 0 to update, 0 to replace, 1 to delete."));
    }

    #[test]
    fn test_composite_change_is_replace() {
        let mut state = State::default();
        state.insert(
            Address::new(ResourceKind::GroupMembership, "alice"),
            record(
                ResourceKind::GroupMembership,
                "ops/u1",
                attrs(&[("group_name", "ops"), ("account_id", "u1")]),
                attrs(&[("group_name", "ops"), ("account_id", "u1")]),
            ),
        );
        let plan = Plan::build(
            &manifest("resources:\n  - {kind: group_membership, name: alice, attributes: {group_name: ops, account_id: u2}}\n"),
            &state,
        );
        assert!(matches!(plan.changes[0].action, Action::Replace { .. }));
    }

    #[test]
    fn test_reordered_grants_are_noop() {
        let yaml = "resources:
  - kind: permission_scheme
    name: ops
    attributes:
      name: Ops
      permissions:
        - {permission: BROWSE_PROJECTS, holder_type: group, holder_parameter: jira-users}
        - {permission: ADMINISTER_PROJECTS, holder_type: projectRole, holder_parameter: '10002'}
";
        let manifest = manifest(yaml);
        let desired = manifest.resources[0].attributes.clone();

        // Reads come back sorted
        let mut observed = desired.clone();
        if let Some(AttrValue::List(grants)) = observed.get_mut("permissions") {
            grants.reverse();
        }

        let mut state = State::default();
        state.insert(
            Address::new(ResourceKind::PermissionScheme, "ops"),
            record(ResourceKind::PermissionScheme, "10011", desired.clone(), observed),
        );
        assert_eq!(Plan::build(&manifest, &state).changes[0].action, Action::NoOp);

        let fewer = manifest.resources[0]
            .attributes
            .get("permissions")
            .and_then(|value| match value {
                AttrValue::List(grants) => Some(grants[..1].to_vec()),
                _ => None,
            })
            .unwrap();
        let mut trimmed = manifest.clone();
        trimmed.resources[0]
            .attributes
            .insert("permissions".to_string(), AttrValue::List(fewer));
        assert_eq!(
            Plan::build(&trimmed, &state).changes[0].action,
            Action::Update {
                fields: vec!["permissions".to_string()]
            }
        );
    }

    #[test]
    fn test_reordered_issue_type_ids_are_noop() {
        let ids = |values: &[&str]| AttrValue::List(values.iter().map(|v| AttrValue::from(*v)).collect());
        let mut applied = attrs(&[("name", "Ops")]);
        applied.insert("issue_type_ids".to_string(), ids(&["10002", "10001"]));
        let mut observed = attrs(&[("name", "Ops")]);
        observed.insert("issue_type_ids".to_string(), ids(&["10001", "10002"]));

        let mut state = State::default();
        state.insert(
            Address::new(ResourceKind::IssueTypeScheme, "ops"),
            record(ResourceKind::IssueTypeScheme, "10010", applied, observed),
        );
        let plan = Plan::build(
            &manifest("resources:\n  - {kind: issue_type_scheme, name: ops, attributes: {name: Ops, issue_type_ids: ['10002', '10001']}}\n"),
            &state,
        );
        assert_eq!(plan.changes[0].action, Action::NoOp);
    }
}
