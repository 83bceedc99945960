//! Custom fields
//!
//! Jira has no by-id fetch for custom fields, so a read pages through the
//! custom field search and scans for the id.

use super::{any_changed, non_empty};
use crate::error::Result;
use crate::models::{CustomField, CustomFieldCreateRequest, CustomFieldUpdateRequest};
use crate::reconciler::descriptor::{InstanceKey, ResourceKind};
use crate::reconciler::handler::{expect_id, Observed, ResourceHandler, UpdateStep};
use crate::reconciler::record::{decode_attributes, encode_attributes, Attributes};
use async_trait::async_trait;
use jira_rest::{encode_segment, ApiRequest, JiraClient};
use serde::{Deserialize, Serialize};

const KIND: ResourceKind = ResourceKind::CustomField;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CustomFieldAttrs {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "type")]
    field_type: String,
    search_key: String,
}

pub struct CustomFieldHandler {
    client: JiraClient,
}

impl CustomFieldHandler {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    fn field_path(id: &str) -> String {
        format!("/rest/api/3/field/{}", encode_segment(id))
    }
}

#[async_trait]
impl ResourceHandler for CustomFieldHandler {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create_request(&self, desired: &Attributes) -> Result<ApiRequest> {
        let attrs: CustomFieldAttrs = decode_attributes(KIND, desired)?;
        let body = CustomFieldCreateRequest {
            name: attrs.name,
            description: attrs.description,
            field_type: attrs.field_type,
            searcher_key: attrs.search_key,
        };
        Ok(ApiRequest::post("/rest/api/3/field").json(&body)?)
    }

    async fn read(&self, key: &InstanceKey) -> Result<Option<Observed>> {
        let id = expect_id(KIND, key)?;
        let request = ApiRequest::get("/rest/api/3/field/search")
            .query("type", "custom")
            .query("expand", "searcherKey");
        let fields: Vec<CustomField> = self.client.fetch_all_pages(&request).await?;

        let Some(field) = fields.into_iter().find(|f| f.id == id) else {
            return Ok(None);
        };

        let observed = CustomFieldAttrs {
            field_type: field.field_type().unwrap_or_default().to_string(),
            search_key: field.searcher_key.clone().unwrap_or_default(),
            name: field.name,
            description: non_empty(field.description),
        };

        Ok(Some(Observed {
            id: field.id,
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

        let attrs: CustomFieldAttrs = decode_attributes(KIND, desired)?;
        let body = CustomFieldUpdateRequest {
            name: attrs.name,
            description: attrs.description,
        };
        Ok(vec![UpdateStep::new(
            "field details",
            ApiRequest::put(Self::field_path(id)).json(&body)?,
        )])
    }

    fn delete_request(&self, key: &InstanceKey) -> Result<ApiRequest> {
        Ok(ApiRequest::delete(Self::field_path(&expect_id(KIND, key)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::record::attrs;
    use jira_rest::mock::MockTransport;
    use jira_rest::{Method, RawResponse};
    use serde_json::json;
    use std::sync::Arc;

    const TEXTFIELD: &str = "com.atlassian.jira.plugin.system.customfieldtypes:textfield";
    const SEARCHER: &str = "com.atlassian.jira.plugin.system.customfieldtypes:textsearcher";

    fn page(values: serde_json::Value, start_at: u64, is_last: bool) -> RawResponse {
        RawResponse::new(
            200,
            json!({"startAt": start_at, "maxResults": 1, "total": 2, "isLast": is_last, "values": values})
                .to_string(),
        )
    }

    #[tokio::test]
    async fn test_read_scans_every_page() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            Method::GET,
            "/rest/api/3/field/search",
            &[("type", "custom"), ("expand", "searcherKey")],
            vec![
                page(json!([{"id": "customfield_10000", "name": "Team"}]), 0, false),
                page(
                    json!([{
                        "id": "customfield_10001",
                        "name": "Root cause",
                        "schema": {"type": "string", "custom": TEXTFIELD},
                        "searcherKey": SEARCHER
                    }]),
                    1,
                    true,
                ),
            ],
        );

        let handler = CustomFieldHandler::new(JiraClient::new(mock.clone()));
        let observed = handler
            .read(&InstanceKey::Id("customfield_10001".to_string()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            observed.attributes,
            attrs(&[("name", "Root cause"), ("type", TEXTFIELD), ("search_key", SEARCHER)])
        );
        assert_eq!(mock.count(Method::GET, "/rest/api/3/field/search"), 2);
    }

    #[tokio::test]
    async fn test_read_miss_is_absent() {
        let mock = Arc::new(MockTransport::new());
        mock.on_get(
            "/rest/api/3/field/search",
            RawResponse::new(200, r#"{"startAt":0,"maxResults":50,"total":0,"isLast":true,"values":[]}"#),
        );
        let handler = CustomFieldHandler::new(JiraClient::new(mock));
        assert!(handler
            .read(&InstanceKey::Id("customfield_404".to_string()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_request() {
        let handler = CustomFieldHandler::new(JiraClient::new(Arc::new(MockTransport::new())));
        let request = handler
            .create_request(&attrs(&[
                ("name", "Root cause"),
                ("type", TEXTFIELD),
                ("search_key", SEARCHER),
            ]))
            .await
            .unwrap();
        assert_eq!(
            request.body,
            Some(json!({"name": "Root cause", "type": TEXTFIELD, "searcherKey": SEARCHER}))
        );
    }
}
