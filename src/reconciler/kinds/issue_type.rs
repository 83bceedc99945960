//! Issue types
//!
//! Managed issue types are always global; `type` is fixed at creation.

use super::{any_changed, non_empty};
use crate::error::{JiraformError, Result};
use crate::models::{IssueType, IssueTypeCreateRequest, IssueTypeUpdateRequest};
use crate::reconciler::descriptor::{InstanceKey, ResourceKind};
use crate::reconciler::handler::{expect_id, Observed, ResourceHandler, UpdateStep};
use crate::reconciler::record::{decode_attributes, encode_attributes, Attributes};
use async_trait::async_trait;
use jira_rest::{encode_segment, ApiRequest, JiraClient};
use serde::{Deserialize, Serialize};
use serde_json::json;

const KIND: ResourceKind = ResourceKind::IssueType;

const TYPE_NAMES: [&str; 2] = ["standard", "subtask"];

fn default_type() -> String {
    "standard".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct IssueTypeAttrs {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "type", default = "default_type")]
    type_name: String,
}

pub struct IssueTypeHandler {
    client: JiraClient,
}

impl IssueTypeHandler {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    fn issue_type_path(id: &str) -> String {
        format!("/rest/api/3/issuetype/{}", encode_segment(id))
    }
}

#[async_trait]
impl ResourceHandler for IssueTypeHandler {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create_request(&self, desired: &Attributes) -> Result<ApiRequest> {
        let attrs: IssueTypeAttrs = decode_attributes(KIND, desired)?;
        if !TYPE_NAMES.contains(&attrs.type_name.as_str()) {
            return Err(JiraformError::invalid(
                KIND.tag(),
                format!("type must be one of {}, got '{}'", TYPE_NAMES.join(", "), attrs.type_name),
            ));
        }

        let body = IssueTypeCreateRequest {
            name: attrs.name,
            description: attrs.description,
            type_name: attrs.type_name,
            scope: json!({ "type": "GLOBAL" }),
        };
        Ok(ApiRequest::post("/rest/api/3/issuetype").json(&body)?)
    }

    async fn read(&self, key: &InstanceKey) -> Result<Option<Observed>> {
        let id = expect_id(KIND, key)?;
        let issue_type: IssueType = self
            .client
            .fetch(&ApiRequest::get(Self::issue_type_path(&id)))
            .await?;

        let observed = IssueTypeAttrs {
            type_name: issue_type.type_name().to_string(),
            name: issue_type.name,
            description: non_empty(issue_type.description),
        };

        Ok(Some(Observed {
            id: issue_type.id,
            attributes: encode_attributes(&observed)?,
        }))
    }

    async fn update_steps(
        &self,
        id: &str,
        desired: &Attributes,
        observed: &Attributes,
    ) -> Result<Vec<UpdateStep>> {
        if !any_changed(desired, observed, &["name", "description"]) {
            return Ok(Vec::new());
        }

        let attrs: IssueTypeAttrs = decode_attributes(KIND, desired)?;
        let body = IssueTypeUpdateRequest {
            name: attrs.name,
            description: attrs.description,
        };
        Ok(vec![UpdateStep::new(
            "issue type details",
            ApiRequest::put(Self::issue_type_path(id)).json(&body)?,
        )])
    }

    fn delete_request(&self, key: &InstanceKey) -> Result<ApiRequest> {
        Ok(ApiRequest::delete(Self::issue_type_path(&expect_id(KIND, key)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::record::attrs;
    use jira_rest::mock::MockTransport;
    use jira_rest::RawResponse;
    use std::sync::Arc;

    fn handler(mock: &Arc<MockTransport>) -> IssueTypeHandler {
        IssueTypeHandler::new(JiraClient::new(mock.clone()))
    }

    #[tokio::test]
    async fn test_create_is_global() {
        let request = handler(&Arc::new(MockTransport::new()))
            .create_request(&attrs(&[("name", "Incident"), ("type", "subtask")]))
            .await
            .unwrap();
        assert_eq!(
            request.body,
            Some(json!({"name": "Incident", "type": "subtask", "scope": {"type": "GLOBAL"}}))
        );
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_type() {
        let err = handler(&Arc::new(MockTransport::new()))
            .create_request(&attrs(&[("name", "Incident"), ("type", "epic")]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("standard, subtask"));
    }

    #[tokio::test]
    async fn test_read_derives_type_from_subtask_flag() {
        let mock = Arc::new(MockTransport::new());
        mock.on_get(
            "/rest/api/3/issuetype/10003",
            RawResponse::new(200, r#"{"id":"10003","name":"Sub-task","subtask":true}"#),
        );
        let observed = handler(&mock)
            .read(&InstanceKey::Id("10003".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(observed.attributes, attrs(&[("name", "Sub-task"), ("type", "subtask")]));
    }
}
