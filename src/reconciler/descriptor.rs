//! Resource descriptors
//!
//! Static per-kind policy: how an instance is identified, which fields force
//! replacement, and what "delete" means. Every kind's deviation from plain
//! CRUD is data in [`DESCRIPTORS`], not a branch in the engine.

use super::record::{AttrValue, Attributes};
use crate::error::{JiraformError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Managed resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Project,
    ProjectComponent,
    WorkflowScheme,
    PermissionScheme,
    IssueType,
    IssueTypeScheme,
    CustomField,
    AutomationRule,
    Group,
    GroupMembership,
}

/// How an instance is addressed remotely
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    /// The server assigns an opaque id on create
    ServerAssignedId,
    /// A human-meaningful attribute is the address
    NaturalKey { field: &'static str },
    /// Two or more attributes joined with `/`
    CompositeKey { fields: &'static [&'static str] },
}

/// What removing an instance means for the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    HardDelete,
    /// Flip the remote entity to an inactive state; never DELETE
    Disable,
    /// Hard delete, and a natural-key change is delete-then-create
    DeleteAndRecreateOnRename,
}

#[derive(Debug)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub identity: IdentityMode,
    pub immutable_fields: &'static [&'static str],
    pub delete_mode: DeleteMode,
    /// Accepted on write but never returned by a read
    pub write_only_fields: &'static [&'static str],
    /// Lists compared as sets: order and duplicates carry no meaning
    pub set_fields: &'static [&'static str],
    /// Response fields that may carry the new id, first match wins
    pub created_id_fields: &'static [&'static str],
}

/// Address of one instance, derived from its id or attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceKey {
    Id(String),
    Natural(String),
    Composite(Vec<String>),
}

impl InstanceKey {
    /// The string form stored as the instance id
    pub fn as_id(&self) -> String {
        match self {
            InstanceKey::Id(id) | InstanceKey::Natural(id) => id.clone(),
            InstanceKey::Composite(parts) => parts.join(COMPOSITE_SEPARATOR),
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_id())
    }
}

pub const COMPOSITE_SEPARATOR: &str = "/";

pub static DESCRIPTORS: [ResourceDescriptor; 10] = [
    ResourceDescriptor {
        kind: ResourceKind::Project,
        identity: IdentityMode::ServerAssignedId,
        immutable_fields: &[],
        delete_mode: DeleteMode::HardDelete,
        write_only_fields: &[],
        set_fields: &[],
        created_id_fields: &["id"],
    },
    ResourceDescriptor {
        kind: ResourceKind::ProjectComponent,
        identity: IdentityMode::ServerAssignedId,
        immutable_fields: &["project_key"],
        delete_mode: DeleteMode::HardDelete,
        write_only_fields: &[],
        set_fields: &[],
        created_id_fields: &["id"],
    },
    ResourceDescriptor {
        kind: ResourceKind::WorkflowScheme,
        identity: IdentityMode::ServerAssignedId,
        immutable_fields: &[],
        delete_mode: DeleteMode::HardDelete,
        write_only_fields: &[],
        set_fields: &[],
        created_id_fields: &["id"],
    },
    ResourceDescriptor {
        kind: ResourceKind::PermissionScheme,
        identity: IdentityMode::ServerAssignedId,
        immutable_fields: &[],
        delete_mode: DeleteMode::HardDelete,
        write_only_fields: &[],
        set_fields: &["permissions"],
        created_id_fields: &["id"],
    },
    ResourceDescriptor {
        kind: ResourceKind::IssueType,
        identity: IdentityMode::ServerAssignedId,
        immutable_fields: &["type"],
        delete_mode: DeleteMode::HardDelete,
        write_only_fields: &[],
        set_fields: &[],
        created_id_fields: &["id"],
    },
    ResourceDescriptor {
        kind: ResourceKind::IssueTypeScheme,
        identity: IdentityMode::ServerAssignedId,
        immutable_fields: &[],
        delete_mode: DeleteMode::HardDelete,
        write_only_fields: &[],
        set_fields: &["issue_type_ids"],
        created_id_fields: &["issueTypeSchemeId", "id"],
    },
    ResourceDescriptor {
        kind: ResourceKind::CustomField,
        identity: IdentityMode::ServerAssignedId,
        immutable_fields: &["type", "search_key"],
        delete_mode: DeleteMode::HardDelete,
        write_only_fields: &[],
        set_fields: &[],
        created_id_fields: &["id"],
    },
    ResourceDescriptor {
        kind: ResourceKind::AutomationRule,
        identity: IdentityMode::ServerAssignedId,
        immutable_fields: &[],
        delete_mode: DeleteMode::Disable,
        write_only_fields: &["rule_json"],
        set_fields: &[],
        created_id_fields: &["id", "ruleUuid"],
    },
    ResourceDescriptor {
        kind: ResourceKind::Group,
        identity: IdentityMode::NaturalKey { field: "name" },
        immutable_fields: &[],
        delete_mode: DeleteMode::DeleteAndRecreateOnRename,
        write_only_fields: &[],
        set_fields: &[],
        created_id_fields: &["groupId"],
    },
    ResourceDescriptor {
        kind: ResourceKind::GroupMembership,
        identity: IdentityMode::CompositeKey {
            fields: &["group_name", "account_id"],
        },
        immutable_fields: &["group_name", "account_id"],
        delete_mode: DeleteMode::HardDelete,
        write_only_fields: &[],
        set_fields: &[],
        created_id_fields: &[],
    },
];

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Project,
        ResourceKind::ProjectComponent,
        ResourceKind::WorkflowScheme,
        ResourceKind::PermissionScheme,
        ResourceKind::IssueType,
        ResourceKind::IssueTypeScheme,
        ResourceKind::CustomField,
        ResourceKind::AutomationRule,
        ResourceKind::Group,
        ResourceKind::GroupMembership,
    ];

    pub fn descriptor(self) -> &'static ResourceDescriptor {
        // DESCRIPTORS is ordered like ALL
        &DESCRIPTORS[self as usize]
    }

    pub fn tag(self) -> &'static str {
        match self {
            ResourceKind::Project => "project",
            ResourceKind::ProjectComponent => "project_component",
            ResourceKind::WorkflowScheme => "workflow_scheme",
            ResourceKind::PermissionScheme => "permission_scheme",
            ResourceKind::IssueType => "issue_type",
            ResourceKind::IssueTypeScheme => "issue_type_scheme",
            ResourceKind::CustomField => "custom_field",
            ResourceKind::AutomationRule => "automation_rule",
            ResourceKind::Group => "group",
            ResourceKind::GroupMembership => "group_membership",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ResourceKind {
    type Err = JiraformError;

    fn from_str(s: &str) -> Result<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| {
                JiraformError::Config(format!(
                    "Unknown resource kind '{}'. Must be one of: {}",
                    s,
                    ResourceKind::ALL.map(|k| k.tag()).join(", ")
                ))
            })
    }
}

impl ResourceDescriptor {
    pub fn is_composite(&self) -> bool {
        matches!(self.identity, IdentityMode::CompositeKey { .. })
    }

    pub fn is_write_only(&self, field: &str) -> bool {
        self.write_only_fields.contains(&field)
    }

    /// Value equality for `field`; set fields ignore order and duplicates
    pub fn same_value(&self, field: &str, a: &AttrValue, b: &AttrValue) -> bool {
        if !self.set_fields.contains(&field) {
            return a == b;
        }
        match (a, b) {
            (AttrValue::List(a), AttrValue::List(b)) => normalized_set(a) == normalized_set(b),
            _ => a == b,
        }
    }

    /// Natural key field, for natural-key kinds
    pub fn natural_key_field(&self) -> Option<&'static str> {
        match self.identity {
            IdentityMode::NaturalKey { field } => Some(field),
            _ => None,
        }
    }

    /// Address an instance from its stored id and attributes
    pub fn instance_key(&self, id: &str, attributes: &Attributes) -> Result<InstanceKey> {
        match self.identity {
            IdentityMode::ServerAssignedId => {
                if id.is_empty() {
                    Err(JiraformError::ContractViolation(format!(
                        "{} instance has no id; it must be created first",
                        self.kind
                    )))
                } else {
                    Ok(InstanceKey::Id(id.to_string()))
                }
            }
            IdentityMode::NaturalKey { field } => self
                .string_attr(attributes, field)
                .map(InstanceKey::Natural)
                .or_else(|| (!id.is_empty()).then(|| InstanceKey::Natural(id.to_string())))
                .ok_or_else(|| JiraformError::invalid(self.kind.tag(), format!("{} is required", field))),
            IdentityMode::CompositeKey { fields } => {
                let from_attributes: Option<Vec<String>> = fields
                    .iter()
                    .map(|field| self.string_attr(attributes, field))
                    .collect();
                match from_attributes {
                    Some(parts) => Ok(InstanceKey::Composite(parts)),
                    None => self.parse_import_id(id),
                }
            }
        }
    }

    /// Address an instance from an operator-supplied import id
    pub fn parse_import_id(&self, import_id: &str) -> Result<InstanceKey> {
        let import_id = import_id.trim();
        if import_id.is_empty() {
            return Err(JiraformError::AmbiguousInput(format!(
                "an import id is required for {}",
                self.kind
            )));
        }

        match self.identity {
            IdentityMode::ServerAssignedId => Ok(InstanceKey::Id(import_id.to_string())),
            IdentityMode::NaturalKey { .. } => Ok(InstanceKey::Natural(import_id.to_string())),
            IdentityMode::CompositeKey { fields } => {
                // Only the leading part may contain the separator
                let mut parts: Vec<String> = import_id
                    .rsplitn(fields.len(), COMPOSITE_SEPARATOR)
                    .map(str::to_string)
                    .collect();
                parts.reverse();
                if parts.len() != fields.len() || parts.iter().any(String::is_empty) {
                    return Err(JiraformError::invalid(
                        self.kind.tag(),
                        format!(
                            "import id must have the form {}",
                            fields.join(COMPOSITE_SEPARATOR)
                        ),
                    ));
                }
                Ok(InstanceKey::Composite(parts))
            }
        }
    }

    /// Fields whose desired value differs from the observed one and that
    /// cannot be changed in place
    pub fn changed_immutable_fields(&self, desired: &Attributes, observed: &Attributes) -> Vec<&'static str> {
        self.immutable_fields
            .iter()
            .copied()
            .filter(|field| match (desired.get(*field), observed.get(*field)) {
                (Some(want), Some(have)) => !self.same_value(field, want, have),
                _ => false,
            })
            .collect()
    }

    fn string_attr(&self, attributes: &Attributes, field: &str) -> Option<String> {
        match attributes.get(field) {
            Some(AttrValue::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(AttrValue::Int(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn normalized_set(items: &[AttrValue]) -> Vec<&AttrValue> {
    let mut sorted: Vec<&AttrValue> = items.iter().collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted.dedup();
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::record::attrs;

    #[test]
    fn test_table_order_matches_kinds() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.descriptor().kind, kind);
            assert_eq!(kind.tag().parse::<ResourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_delete_modes() {
        assert_eq!(
            ResourceKind::AutomationRule.descriptor().delete_mode,
            DeleteMode::Disable
        );
        assert_eq!(
            ResourceKind::Group.descriptor().delete_mode,
            DeleteMode::DeleteAndRecreateOnRename
        );
        assert!(ResourceKind::GroupMembership.descriptor().is_composite());
        assert!(ResourceKind::AutomationRule.descriptor().is_write_only("rule_json"));
    }

    #[test]
    fn test_instance_key_by_identity() {
        let group = ResourceKind::Group.descriptor();
        assert_eq!(
            group
                .instance_key("g-1", &attrs(&[("name", "jira-devs")]))
                .unwrap(),
            InstanceKey::Natural("jira-devs".to_string())
        );

        let membership = ResourceKind::GroupMembership.descriptor();
        let key = membership
            .instance_key(
                "",
                &attrs(&[("group_name", "devs"), ("account_id", "acc-1")]),
            )
            .unwrap();
        assert_eq!(key.as_id(), "devs/acc-1");

        let project = ResourceKind::Project.descriptor();
        assert!(matches!(
            project.instance_key("", &Attributes::new()),
            Err(JiraformError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_parse_import_id() {
        let membership = ResourceKind::GroupMembership.descriptor();
        assert_eq!(
            membership.parse_import_id("devs/acc-1").unwrap(),
            InstanceKey::Composite(vec!["devs".to_string(), "acc-1".to_string()])
        );
        assert!(membership.parse_import_id("devs").is_err());
        assert!(membership.parse_import_id("devs/").is_err());
        assert!(membership.parse_import_id("/acc-1").is_err());
        assert!(ResourceKind::Project.descriptor().parse_import_id(" ").is_err());
    }

    #[test]
    fn test_parse_import_id_group_name_with_separator() {
        let membership = ResourceKind::GroupMembership.descriptor();
        assert_eq!(
            membership.parse_import_id("site-admins/eu/acc-1").unwrap(),
            InstanceKey::Composite(vec!["site-admins/eu".to_string(), "acc-1".to_string()])
        );
    }

    #[test]
    fn test_set_fields_ignore_order() {
        let list = |ids: &[&str]| AttrValue::List(ids.iter().map(|id| AttrValue::from(*id)).collect());

        let scheme = ResourceKind::IssueTypeScheme.descriptor();
        assert!(scheme.same_value(
            "issue_type_ids",
            &list(&["10002", "10001", "10001"]),
            &list(&["10001", "10002"])
        ));
        assert!(!scheme.same_value(
            "issue_type_ids",
            &list(&["10001", "10003"]),
            &list(&["10001", "10002"])
        ));

        // Ordinary lists stay ordered
        let project = ResourceKind::Project.descriptor();
        assert!(!project.same_value("tags", &list(&["a", "b"]), &list(&["b", "a"])));
    }

    #[test]
    fn test_changed_immutable_fields() {
        let field = ResourceKind::CustomField.descriptor();
        let desired = attrs(&[("name", "Team"), ("type", "textfield"), ("search_key", "s")]);
        let observed = attrs(&[("name", "Squad"), ("type", "select"), ("search_key", "s")]);
        assert_eq!(field.changed_immutable_fields(&desired, &observed), vec!["type"]);
    }
}
