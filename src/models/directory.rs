//! Read-only lookups: users and workflows

use serde::Deserialize;

/// `GET /rest/api/3/user?accountId=` and `GET /rest/api/3/user/search`
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(rename = "accountId")]
    pub account_id: String,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "emailAddress", default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "timeZone", default)]
    pub time_zone: Option<String>,
}

/// Workflows are identified by name
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowId {
    pub name: String,
    #[serde(rename = "entityId", default)]
    pub entity_id: Option<String>,
}

/// One value of `GET /rest/api/3/workflow/search`
#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
    #[serde(default)]
    pub statuses: Vec<serde_json::Value>,
}
