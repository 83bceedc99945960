//! Project components

use super::{any_changed, non_empty};
use crate::error::Result;
use crate::models::{Component, ComponentRequest};
use crate::reconciler::descriptor::{InstanceKey, ResourceKind};
use crate::reconciler::handler::{expect_id, Observed, ResourceHandler, UpdateStep};
use crate::reconciler::record::{decode_attributes, encode_attributes, Attributes};
use async_trait::async_trait;
use jira_rest::{encode_segment, ApiRequest, JiraClient};
use serde::{Deserialize, Serialize};

const KIND: ResourceKind = ResourceKind::ProjectComponent;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ComponentAttrs {
    project_key: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lead_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assignee_type: Option<String>,
}

pub struct ProjectComponentHandler {
    client: JiraClient,
}

impl ProjectComponentHandler {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    fn component_path(id: &str) -> String {
        format!("/rest/api/3/component/{}", encode_segment(id))
    }
}

#[async_trait]
impl ResourceHandler for ProjectComponentHandler {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create_request(&self, desired: &Attributes) -> Result<ApiRequest> {
        let attrs: ComponentAttrs = decode_attributes(KIND, desired)?;
        let body = ComponentRequest {
            project: Some(attrs.project_key),
            name: attrs.name,
            description: attrs.description,
            lead_account_id: attrs.lead_account_id,
            assignee_type: attrs.assignee_type,
        };
        Ok(ApiRequest::post("/rest/api/3/component").json(&body)?)
    }

    async fn read(&self, key: &InstanceKey) -> Result<Option<Observed>> {
        let id = expect_id(KIND, key)?;
        let component: Component = self
            .client
            .fetch(&ApiRequest::get(Self::component_path(&id)))
            .await?;

        let observed = ComponentAttrs {
            project_key: component.project.unwrap_or_default(),
            name: component.name,
            description: non_empty(component.description),
            lead_account_id: component.lead.map(|l| l.account_id),
            assignee_type: non_empty(component.assignee_type),
        };

        Ok(Some(Observed {
            id: component.id,
            attributes: encode_attributes(&observed)?,
        }))
    }

    async fn update_steps(
        &self,
        id: &str,
        desired: &Attributes,
        observed: &Attributes,
    ) -> Result<Vec<UpdateStep>> {
        if !any_changed(
            desired,
            observed,
            &["name", "description", "lead_account_id", "assignee_type"],
        ) {
            return Ok(Vec::new());
        }

        let attrs: ComponentAttrs = decode_attributes(KIND, desired)?;
        let body = ComponentRequest {
            project: None,
            name: attrs.name,
            description: attrs.description,
            lead_account_id: attrs.lead_account_id,
            assignee_type: attrs.assignee_type,
        };
        Ok(vec![UpdateStep::new(
            "component details",
            ApiRequest::put(Self::component_path(id)).json(&body)?,
        )])
    }

    fn delete_request(&self, key: &InstanceKey) -> Result<ApiRequest> {
        Ok(ApiRequest::delete(Self::component_path(&expect_id(KIND, key)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::record::attrs;
    use jira_rest::mock::MockTransport;
    use jira_rest::RawResponse;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_sends_project_key() {
        let handler = ProjectComponentHandler::new(JiraClient::new(Arc::new(MockTransport::new())));
        let request = handler
            .create_request(&attrs(&[("project_key", "OPS"), ("name", "Backend")]))
            .await
            .unwrap();
        assert_eq!(request.path, "/rest/api/3/component");
        assert_eq!(request.body, Some(json!({"project": "OPS", "name": "Backend"})));
    }

    #[tokio::test]
    async fn test_unknown_attribute_is_invalid() {
        let handler = ProjectComponentHandler::new(JiraClient::new(Arc::new(MockTransport::new())));
        let err = handler
            .create_request(&attrs(&[("project_key", "OPS"), ("name", "Backend"), ("colour", "red")]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("colour"));
    }

    #[tokio::test]
    async fn test_read_and_update() {
        let mock = Arc::new(MockTransport::new());
        mock.on_get(
            "/rest/api/3/component/10050",
            RawResponse::new(
                200,
                json!({"id": "10050", "name": "Backend", "project": "OPS", "projectId": 10000})
                    .to_string(),
            ),
        );
        let handler = ProjectComponentHandler::new(JiraClient::new(mock.clone()));

        let observed = handler
            .read(&InstanceKey::Id("10050".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(observed.attributes, attrs(&[("project_key", "OPS"), ("name", "Backend")]));

        let unchanged = handler
            .update_steps("10050", &observed.attributes, &observed.attributes)
            .await
            .unwrap();
        assert!(unchanged.is_empty());

        let renamed = attrs(&[("project_key", "OPS"), ("name", "API")]);
        let steps = handler
            .update_steps("10050", &renamed, &observed.attributes)
            .await
            .unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].request.body, Some(json!({"name": "API"})));
    }
}
