//! Typed wire records
//!
//! One record per remote entity kind plus the request bodies sent to create
//! and update it. Unknown response fields are ignored; ids that Jira returns
//! as numbers on some endpoints and strings on others are normalized to
//! strings.

mod automation;
mod directory;
mod field;
mod group;
mod issue_type;
mod project;
mod scheme;

pub use automation::{AutomationRule, RuleState, RuleStateRequest};
pub use directory::{User, Workflow, WorkflowId};
pub use field::{CustomField, CustomFieldCreateRequest, CustomFieldUpdateRequest, FieldSchema};
pub use group::{AddMemberRequest, Group, GroupCreateRequest, GroupMember};
pub use issue_type::{
    IssueType, IssueTypeCreateRequest, IssueTypeIdsRequest, IssueTypeScheme,
    IssueTypeSchemeCreateRequest, IssueTypeSchemeMapping, IssueTypeSchemeUpdateRequest,
    IssueTypeUpdateRequest,
};
pub use project::{
    Component, ComponentRequest, IssueTypeSchemeAssignment, IssueTypeSchemeProjects, Project,
    ProjectCreateRequest, ProjectUpdateRequest, SchemeRef, WorkflowSchemeAssignment,
    WorkflowSchemeProjects,
};
pub use scheme::{
    PermissionGrant, PermissionHolder, PermissionScheme, PermissionSchemeList,
    PermissionSchemeRequest, WorkflowScheme, WorkflowSchemeRequest,
};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Reference to a user by account id (`lead`, `assignee`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(rename = "accountId")]
    pub account_id: String,
}

/// Deserialize an id that may arrive as a JSON string or number
pub fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Optional variant of [`id_string`]; `null` and absent both map to `None`
pub fn opt_id_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Parse a numeric id for endpoints that insist on integers
pub fn numeric_id(kind: &str, field: &str, value: &str) -> crate::Result<i64> {
    value.trim().parse::<i64>().map_err(|_| {
        crate::JiraformError::invalid(
            kind,
            format!("{} must be a numeric id, got '{}'", field, value),
        )
    })
}
