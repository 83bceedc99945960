//! Projects
//!
//! Base attributes and the three scheme assignments are separate remote
//! sub-resources, so an update is up to four independent calls.

use super::{any_changed, non_empty};
use crate::error::Result;
use crate::models::{
    numeric_id, IssueTypeSchemeAssignment, IssueTypeSchemeProjects, Project,
    ProjectCreateRequest, ProjectUpdateRequest, SchemeRef, WorkflowSchemeAssignment,
    WorkflowSchemeProjects,
};
use crate::reconciler::descriptor::{InstanceKey, ResourceKind};
use crate::reconciler::handler::{expect_id, Observed, ResourceHandler, UpdateStep};
use crate::reconciler::record::{decode_attributes, encode_attributes, Attributes};
use async_trait::async_trait;
use jira_rest::{encode_segment, ApiRequest, JiraClient};
use serde::{Deserialize, Serialize};
use serde_json::json;

const KIND: ResourceKind = ResourceKind::Project;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectAttrs {
    key: String,
    name: String,
    project_type_key: String,
    lead_account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assignee_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    issue_type_scheme_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    permission_scheme_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    workflow_scheme_id: Option<String>,
}

pub struct ProjectHandler {
    client: JiraClient,
}

impl ProjectHandler {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    fn project_path(id: &str) -> String {
        format!("/rest/api/3/project/{}", encode_segment(id))
    }

    /// A 404 on an assignment endpoint means "nothing assigned"
    async fn permission_scheme(&self, id: &str) -> Result<Option<String>> {
        let request = ApiRequest::get(format!("{}/permissionscheme", Self::project_path(id)));
        match self.client.fetch::<SchemeRef>(&request).await {
            Ok(scheme) => Ok(Some(scheme.id)),
            Err(e) if jira_rest::is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn issue_type_scheme(&self, id: &str) -> Result<Option<String>> {
        let request = ApiRequest::get("/rest/api/3/issuetypescheme/project").query("projectId", id);
        match self
            .client
            .fetch_all_pages::<IssueTypeSchemeProjects>(&request)
            .await
        {
            Ok(values) => Ok(values
                .into_iter()
                .find(|v| v.project_ids.is_empty() || v.project_ids.iter().any(|p| p == id))
                .map(|v| v.issue_type_scheme.id)),
            Err(e) if jira_rest::is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn workflow_scheme(&self, id: &str) -> Result<Option<String>> {
        let request = ApiRequest::get("/rest/api/3/workflowscheme/project").query("projectId", id);
        match self
            .client
            .fetch_all_pages::<WorkflowSchemeProjects>(&request)
            .await
        {
            Ok(values) => Ok(values
                .into_iter()
                .find(|v| v.project_ids.is_empty() || v.project_ids.iter().any(|p| p == id))
                .map(|v| v.workflow_scheme.id)),
            Err(e) if jira_rest::is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn optional_numeric(field: &str, value: &Option<String>) -> Result<Option<i64>> {
    value
        .as_deref()
        .map(|v| numeric_id(KIND.tag(), field, v))
        .transpose()
}

#[async_trait]
impl ResourceHandler for ProjectHandler {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create_request(&self, desired: &Attributes) -> Result<ApiRequest> {
        let attrs: ProjectAttrs = decode_attributes(KIND, desired)?;
        let body = ProjectCreateRequest {
            issue_type_scheme: optional_numeric("issue_type_scheme_id", &attrs.issue_type_scheme_id)?,
            permission_scheme: optional_numeric("permission_scheme_id", &attrs.permission_scheme_id)?,
            workflow_scheme: optional_numeric("workflow_scheme_id", &attrs.workflow_scheme_id)?,
            key: attrs.key,
            name: attrs.name,
            project_type_key: attrs.project_type_key,
            lead_account_id: attrs.lead_account_id,
            description: attrs.description,
            assignee_type: attrs.assignee_type,
        };
        Ok(ApiRequest::post("/rest/api/3/project").json(&body)?)
    }

    async fn read(&self, key: &InstanceKey) -> Result<Option<Observed>> {
        let id = expect_id(KIND, key)?;
        let project: Project = self
            .client
            .fetch(&ApiRequest::get(Self::project_path(&id)))
            .await?;

        let observed = ProjectAttrs {
            issue_type_scheme_id: self.issue_type_scheme(&project.id).await?,
            permission_scheme_id: self.permission_scheme(&project.id).await?,
            workflow_scheme_id: self.workflow_scheme(&project.id).await?,
            key: project.key,
            name: project.name,
            project_type_key: project.project_type_key.unwrap_or_default(),
            lead_account_id: project.lead.map(|l| l.account_id).unwrap_or_default(),
            description: non_empty(project.description),
            assignee_type: non_empty(project.assignee_type),
        };

        Ok(Some(Observed {
            id: project.id,
            attributes: encode_attributes(&observed)?,
        }))
    }

    async fn update_steps(
        &self,
        id: &str,
        desired: &Attributes,
        observed: &Attributes,
    ) -> Result<Vec<UpdateStep>> {
        let attrs: ProjectAttrs = decode_attributes(KIND, desired)?;
        let mut steps = Vec::new();

        if any_changed(
            desired,
            observed,
            &["key", "name", "lead_account_id", "description", "assignee_type"],
        ) {
            let body = ProjectUpdateRequest {
                key: attrs.key.clone(),
                name: attrs.name.clone(),
                lead_account_id: attrs.lead_account_id.clone(),
                description: attrs.description.clone(),
                assignee_type: attrs.assignee_type.clone(),
            };
            steps.push(UpdateStep::new(
                "project details",
                ApiRequest::put(Self::project_path(id)).json(&body)?,
            ));
        }

        if any_changed(desired, observed, &["issue_type_scheme_id"]) {
            if let Some(scheme_id) = &attrs.issue_type_scheme_id {
                let body = IssueTypeSchemeAssignment {
                    issue_type_scheme_id: scheme_id.clone(),
                    project_id: id.to_string(),
                };
                steps.push(UpdateStep::new(
                    "issue type scheme assignment",
                    ApiRequest::put("/rest/api/3/issuetypescheme/project").json(&body)?,
                ));
            }
        }

        if any_changed(desired, observed, &["permission_scheme_id"]) {
            if let Some(scheme_id) = optional_numeric("permission_scheme_id", &attrs.permission_scheme_id)? {
                steps.push(UpdateStep::new(
                    "permission scheme assignment",
                    ApiRequest::put(format!("{}/permissionscheme", Self::project_path(id)))
                        .body(json!({ "id": scheme_id })),
                ));
            }
        }

        if any_changed(desired, observed, &["workflow_scheme_id"]) {
            if let Some(scheme_id) = &attrs.workflow_scheme_id {
                let body = WorkflowSchemeAssignment {
                    project_id: id.to_string(),
                    workflow_scheme_id: scheme_id.clone(),
                };
                steps.push(UpdateStep::new(
                    "workflow scheme assignment",
                    ApiRequest::put("/rest/api/3/workflowscheme/project").json(&body)?,
                ));
            }
        }

        Ok(steps)
    }

    fn delete_request(&self, key: &InstanceKey) -> Result<ApiRequest> {
        Ok(ApiRequest::delete(Self::project_path(&expect_id(KIND, key)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::record::attrs;
    use jira_rest::mock::MockTransport;
    use jira_rest::{Method, RawResponse};
    use std::sync::Arc;

    fn ok(body: serde_json::Value) -> RawResponse {
        RawResponse::new(200, body.to_string())
    }

    fn desired() -> Attributes {
        attrs(&[
            ("key", "OPS"),
            ("name", "Operations"),
            ("project_type_key", "software"),
            ("lead_account_id", "lead-1"),
            ("permission_scheme_id", "10011"),
        ])
    }

    #[tokio::test]
    async fn test_create_folds_numeric_scheme_ids() {
        let handler = ProjectHandler::new(JiraClient::new(Arc::new(MockTransport::new())));
        let request = handler.create_request(&desired()).await.unwrap();
        let body = request.body.unwrap();
        assert_eq!(body["permissionScheme"], json!(10011));
        assert_eq!(body["leadAccountId"], json!("lead-1"));
        assert!(body.get("workflowScheme").is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_non_numeric_scheme() {
        let handler = ProjectHandler::new(JiraClient::new(Arc::new(MockTransport::new())));
        let mut bad = desired();
        bad.insert("workflow_scheme_id".to_string(), "abc".into());
        let err = handler.create_request(&bad).await.unwrap_err();
        assert_eq!(err.class(), crate::ErrorClass::Validation);
    }

    #[tokio::test]
    async fn test_read_treats_assignment_404_as_unassigned() {
        let mock = Arc::new(MockTransport::new());
        mock.on_get(
            "/rest/api/3/project/10000",
            ok(json!({
                "id": "10000", "key": "OPS", "name": "Operations",
                "projectTypeKey": "software", "lead": {"accountId": "lead-1"},
                "description": ""
            })),
        );
        mock.on_get(
            "/rest/api/3/project/10000/permissionscheme",
            ok(json!({"id": 10011, "name": "Restricted"})),
        );
        mock.on_get(
            "/rest/api/3/issuetypescheme/project",
            RawResponse::new(404, r#"{"errorMessages":["none"]}"#),
        );
        mock.on_get(
            "/rest/api/3/workflowscheme/project",
            ok(json!({
                "startAt": 0, "maxResults": 50, "total": 1, "isLast": true,
                "values": [{"workflowScheme": {"id": 10200}, "projectIds": ["10000"]}]
            })),
        );

        let handler = ProjectHandler::new(JiraClient::new(mock.clone()));
        let observed = handler
            .read(&InstanceKey::Id("10000".to_string()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(observed.id, "10000");
        assert_eq!(observed.attributes["permission_scheme_id"].as_str(), Some("10011"));
        assert_eq!(observed.attributes["workflow_scheme_id"].as_str(), Some("10200"));
        assert!(!observed.attributes.contains_key("issue_type_scheme_id"));
        assert!(!observed.attributes.contains_key("description"));
    }

    #[tokio::test]
    async fn test_update_only_touches_changed_sub_resources() {
        let handler = ProjectHandler::new(JiraClient::new(Arc::new(MockTransport::new())));
        let observed = desired();
        let mut wanted = desired();
        wanted.insert("permission_scheme_id".to_string(), "10012".into());
        wanted.insert("workflow_scheme_id".to_string(), "10200".into());

        let steps = handler.update_steps("10000", &wanted, &observed).await.unwrap();
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["permission scheme assignment", "workflow scheme assignment"]
        );
        assert_eq!(steps[0].request.method, Method::PUT);
        assert_eq!(steps[0].request.path, "/rest/api/3/project/10000/permissionscheme");
        assert_eq!(steps[0].request.body, Some(json!({"id": 10012})));
        assert_eq!(
            steps[1].request.body,
            Some(json!({"projectId": "10000", "workflowSchemeId": "10200"}))
        );
    }

    #[tokio::test]
    async fn test_update_details_first() {
        let handler = ProjectHandler::new(JiraClient::new(Arc::new(MockTransport::new())));
        let mut wanted = desired();
        wanted.insert("name".to_string(), "Ops".into());
        wanted.insert("issue_type_scheme_id".to_string(), "10010".into());

        let steps = handler.update_steps("10000", &wanted, &desired()).await.unwrap();
        assert_eq!(steps[0].name, "project details");
        assert_eq!(steps[1].name, "issue type scheme assignment");
    }
}
