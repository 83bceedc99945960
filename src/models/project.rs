//! Projects, their scheme assignments and components

use super::{id_string, opt_id_string, UserRef};
use serde::{Deserialize, Serialize};

/// `GET /rest/api/3/project/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "projectTypeKey", default)]
    pub project_type_key: Option<String>,
    #[serde(default)]
    pub lead: Option<UserRef>,
    #[serde(rename = "assigneeType", default)]
    pub assignee_type: Option<String>,
}

/// `POST /rest/api/3/project`
#[derive(Debug, Clone, Serialize)]
pub struct ProjectCreateRequest {
    pub key: String,
    pub name: String,
    #[serde(rename = "projectTypeKey")]
    pub project_type_key: String,
    #[serde(rename = "leadAccountId")]
    pub lead_account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "assigneeType", skip_serializing_if = "Option::is_none")]
    pub assignee_type: Option<String>,
    #[serde(rename = "issueTypeScheme", skip_serializing_if = "Option::is_none")]
    pub issue_type_scheme: Option<i64>,
    #[serde(rename = "permissionScheme", skip_serializing_if = "Option::is_none")]
    pub permission_scheme: Option<i64>,
    #[serde(rename = "workflowScheme", skip_serializing_if = "Option::is_none")]
    pub workflow_scheme: Option<i64>,
}

/// `PUT /rest/api/3/project/{id}`; scheme ids go through their own endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ProjectUpdateRequest {
    pub key: String,
    pub name: String,
    #[serde(rename = "leadAccountId")]
    pub lead_account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "assigneeType", skip_serializing_if = "Option::is_none")]
    pub assignee_type: Option<String>,
}

/// `{id, name}` reference to a scheme
#[derive(Debug, Clone, Deserialize)]
pub struct SchemeRef {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One value of `GET /rest/api/3/issuetypescheme/project?projectId=`
#[derive(Debug, Clone, Deserialize)]
pub struct IssueTypeSchemeProjects {
    #[serde(rename = "issueTypeScheme")]
    pub issue_type_scheme: SchemeRef,
    #[serde(rename = "projectIds", default)]
    pub project_ids: Vec<String>,
}

/// One value of `GET /rest/api/3/workflowscheme/project?projectId=`
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSchemeProjects {
    #[serde(rename = "workflowScheme")]
    pub workflow_scheme: SchemeRef,
    #[serde(rename = "projectIds", default)]
    pub project_ids: Vec<String>,
}

/// `PUT /rest/api/3/issuetypescheme/project`
#[derive(Debug, Clone, Serialize)]
pub struct IssueTypeSchemeAssignment {
    #[serde(rename = "issueTypeSchemeId")]
    pub issue_type_scheme_id: String,
    #[serde(rename = "projectId")]
    pub project_id: String,
}

/// `PUT /rest/api/3/workflowscheme/project`
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSchemeAssignment {
    #[serde(rename = "projectId")]
    pub project_id: String,
    #[serde(rename = "workflowSchemeId")]
    pub workflow_scheme_id: String,
}

/// `GET /rest/api/3/component/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct Component {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lead: Option<UserRef>,
    #[serde(rename = "assigneeType", default)]
    pub assignee_type: Option<String>,
    /// Project key
    #[serde(default)]
    pub project: Option<String>,
    #[serde(rename = "projectId", default, deserialize_with = "opt_id_string")]
    pub project_id: Option<String>,
}

/// `POST /rest/api/3/component` and `PUT /rest/api/3/component/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct ComponentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "leadAccountId", skip_serializing_if = "Option::is_none")]
    pub lead_account_id: Option<String>,
    #[serde(rename = "assigneeType", skip_serializing_if = "Option::is_none")]
    pub assignee_type: Option<String>,
}
