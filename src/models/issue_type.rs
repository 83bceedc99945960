//! Issue types and issue type schemes

use super::{id_string, opt_id_string};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /rest/api/3/issuetype/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct IssueType {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subtask: bool,
    #[serde(rename = "hierarchyLevel", default)]
    pub hierarchy_level: Option<i64>,
    /// Present only on project-scoped types; see [`crate::scope::is_scoped`]
    #[serde(default)]
    pub scope: Option<Value>,
}

impl IssueType {
    /// `standard` or `subtask`, the vocabulary used when creating
    pub fn type_name(&self) -> &'static str {
        if self.subtask {
            "subtask"
        } else {
            "standard"
        }
    }
}

/// `POST /rest/api/3/issuetype`
#[derive(Debug, Clone, Serialize)]
pub struct IssueTypeCreateRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Always `{"type": "GLOBAL"}`: managed issue types are classic types
    pub scope: Value,
}

/// `PUT /rest/api/3/issuetype/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct IssueTypeUpdateRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One value of `GET /rest/api/3/issuetypescheme`
#[derive(Debug, Clone, Deserialize)]
pub struct IssueTypeScheme {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "defaultIssueTypeId", default, deserialize_with = "opt_id_string")]
    pub default_issue_type_id: Option<String>,
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

/// `POST /rest/api/3/issuetypescheme`
#[derive(Debug, Clone, Serialize)]
pub struct IssueTypeSchemeCreateRequest {
    pub name: String,
    #[serde(rename = "issueTypeIds")]
    pub issue_type_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "defaultIssueTypeId", skip_serializing_if = "Option::is_none")]
    pub default_issue_type_id: Option<String>,
}

/// `PUT /rest/api/3/issuetypescheme/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct IssueTypeSchemeUpdateRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "defaultIssueTypeId", skip_serializing_if = "Option::is_none")]
    pub default_issue_type_id: Option<String>,
}

/// `PUT /rest/api/3/issuetypescheme/{id}/issuetype`
#[derive(Debug, Clone, Serialize)]
pub struct IssueTypeIdsRequest {
    #[serde(rename = "issueTypeIds")]
    pub issue_type_ids: Vec<String>,
}

/// One value of `GET /rest/api/3/issuetypescheme/mapping`
#[derive(Debug, Clone, Deserialize)]
pub struct IssueTypeSchemeMapping {
    #[serde(rename = "issueTypeSchemeId", deserialize_with = "id_string")]
    pub issue_type_scheme_id: String,
    #[serde(rename = "issueTypeId", deserialize_with = "id_string")]
    pub issue_type_id: String,
}
