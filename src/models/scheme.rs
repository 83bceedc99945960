//! Workflow schemes and permission schemes

use super::id_string;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `GET /rest/api/3/workflowscheme/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowScheme {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "defaultWorkflow", default)]
    pub default_workflow: Option<String>,
    /// Issue type id to workflow name
    #[serde(rename = "issueTypeMappings", default)]
    pub issue_type_mappings: BTreeMap<String, String>,
}

/// `POST /rest/api/3/workflowscheme` and `PUT /rest/api/3/workflowscheme/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSchemeRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "defaultWorkflow", skip_serializing_if = "Option::is_none")]
    pub default_workflow: Option<String>,
    #[serde(rename = "issueTypeMappings", skip_serializing_if = "BTreeMap::is_empty")]
    pub issue_type_mappings: BTreeMap<String, String>,
}

/// Who a permission is granted to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionHolder {
    #[serde(rename = "type")]
    pub holder_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

/// One grant: a permission key plus its holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub permission: String,
    pub holder: PermissionHolder,
}

/// `GET /rest/api/3/permissionscheme/{id}?expand=permissions`
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionScheme {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<PermissionGrant>,
}

/// `GET /rest/api/3/permissionscheme` wraps its listing in `permissionSchemes`
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionSchemeList {
    #[serde(rename = "permissionSchemes", default)]
    pub permission_schemes: Vec<PermissionScheme>,
}

/// `POST /rest/api/3/permissionscheme` and `PUT /rest/api/3/permissionscheme/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct PermissionSchemeRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<PermissionGrant>,
}
