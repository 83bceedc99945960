//! Permission schemes
//!
//! Grants are flat `{permission, holder_type, holder_parameter}` attributes
//! locally and `{permission, holder: {type, parameter}}` on the wire.

use super::{any_changed, non_empty};
use crate::error::Result;
use crate::models::{PermissionGrant, PermissionHolder, PermissionScheme, PermissionSchemeRequest};
use crate::reconciler::descriptor::{InstanceKey, ResourceKind};
use crate::reconciler::handler::{expect_id, Observed, ResourceHandler, UpdateStep};
use crate::reconciler::record::{decode_attributes, encode_attributes, Attributes};
use async_trait::async_trait;
use jira_rest::{encode_segment, ApiRequest, JiraClient};
use serde::{Deserialize, Serialize};

const KIND: ResourceKind = ResourceKind::PermissionScheme;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct GrantAttrs {
    permission: String,
    holder_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    holder_parameter: Option<String>,
}

impl From<GrantAttrs> for PermissionGrant {
    fn from(grant: GrantAttrs) -> Self {
        PermissionGrant {
            permission: grant.permission,
            holder: PermissionHolder {
                holder_type: grant.holder_type,
                parameter: grant.holder_parameter,
            },
        }
    }
}

impl From<PermissionGrant> for GrantAttrs {
    fn from(grant: PermissionGrant) -> Self {
        GrantAttrs {
            permission: grant.permission,
            holder_type: grant.holder.holder_type,
            holder_parameter: grant.holder.parameter,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PermissionSchemeAttrs {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    permissions: Vec<GrantAttrs>,
}

impl From<PermissionSchemeAttrs> for PermissionSchemeRequest {
    fn from(attrs: PermissionSchemeAttrs) -> Self {
        PermissionSchemeRequest {
            name: attrs.name,
            description: attrs.description,
            permissions: attrs.permissions.into_iter().map(PermissionGrant::from).collect(),
        }
    }
}

pub struct PermissionSchemeHandler {
    client: JiraClient,
}

impl PermissionSchemeHandler {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    fn scheme_path(id: &str) -> String {
        format!("/rest/api/3/permissionscheme/{}", encode_segment(id))
    }
}

/// Grants compare as a set; Jira does not preserve their order
fn grants_differ(desired: &PermissionSchemeAttrs, observed: &Attributes) -> Result<bool> {
    let observed: PermissionSchemeAttrs = decode_attributes(KIND, observed)?;
    let mut want = desired.permissions.clone();
    let mut have = observed.permissions;
    want.sort();
    want.dedup();
    have.sort();
    have.dedup();
    Ok(want != have)
}

#[async_trait]
impl ResourceHandler for PermissionSchemeHandler {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create_request(&self, desired: &Attributes) -> Result<ApiRequest> {
        let attrs: PermissionSchemeAttrs = decode_attributes(KIND, desired)?;
        Ok(ApiRequest::post("/rest/api/3/permissionscheme")
            .json(&PermissionSchemeRequest::from(attrs))?)
    }

    async fn read(&self, key: &InstanceKey) -> Result<Option<Observed>> {
        let id = expect_id(KIND, key)?;
        let request = ApiRequest::get(Self::scheme_path(&id)).query("expand", "permissions");
        let scheme: PermissionScheme = self.client.fetch(&request).await?;

        let mut permissions: Vec<GrantAttrs> =
            scheme.permissions.into_iter().map(GrantAttrs::from).collect();
        permissions.sort();

        let observed = PermissionSchemeAttrs {
            name: scheme.name,
            description: non_empty(scheme.description),
            permissions,
        };

        Ok(Some(Observed {
            id: scheme.id,
            attributes: encode_attributes(&observed)?,
        }))
    }

    async fn update_steps(
        &self,
        id: &str,
        desired: &Attributes,
        observed: &Attributes,
    ) -> Result<Vec<UpdateStep>> {
        let attrs: PermissionSchemeAttrs = decode_attributes(KIND, desired)?;
        if !any_changed(desired, observed, &["name", "description"]) && !grants_differ(&attrs, observed)? {
            return Ok(Vec::new());
        }

        Ok(vec![UpdateStep::new(
            "permission scheme details",
            ApiRequest::put(Self::scheme_path(id)).json(&PermissionSchemeRequest::from(attrs))?,
        )])
    }

    fn delete_request(&self, key: &InstanceKey) -> Result<ApiRequest> {
        Ok(ApiRequest::delete(Self::scheme_path(&expect_id(KIND, key)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jira_rest::mock::MockTransport;
    use jira_rest::RawResponse;
    use serde_json::json;
    use std::sync::Arc;

    fn handler(mock: &Arc<MockTransport>) -> PermissionSchemeHandler {
        PermissionSchemeHandler::new(JiraClient::new(mock.clone()))
    }

    fn desired() -> Attributes {
        serde_json::from_value(json!({
            "name": "Restricted",
            "permissions": [
                {"permission": "BROWSE_PROJECTS", "holder_type": "group", "holder_parameter": "jira-users"},
                {"permission": "ADMINISTER_PROJECTS", "holder_type": "projectLead"}
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_folds_holder() {
        let request = handler(&Arc::new(MockTransport::new()))
            .create_request(&desired())
            .await
            .unwrap();
        assert_eq!(
            request.body.unwrap()["permissions"],
            json!([
                {"permission": "BROWSE_PROJECTS", "holder": {"type": "group", "parameter": "jira-users"}},
                {"permission": "ADMINISTER_PROJECTS", "holder": {"type": "projectLead"}}
            ])
        );
    }

    #[tokio::test]
    async fn test_read_expands_permissions_and_reorders() {
        let mock = Arc::new(MockTransport::new());
        mock.on_get_query(
            "/rest/api/3/permissionscheme/10011",
            &[("expand", "permissions")],
            RawResponse::new(
                200,
                json!({
                    "id": 10011,
                    "name": "Restricted",
                    "permissions": [
                        {"id": 1, "permission": "BROWSE_PROJECTS",
                         "holder": {"type": "group", "parameter": "jira-users"}},
                        {"id": 2, "permission": "ADMINISTER_PROJECTS",
                         "holder": {"type": "projectLead"}}
                    ]
                })
                .to_string(),
            ),
        );

        let handler = handler(&mock);
        let observed = handler
            .read(&InstanceKey::Id("10011".to_string()))
            .await
            .unwrap()
            .unwrap();

        // Same grants in a different order are not a change
        let steps = handler
            .update_steps("10011", &desired(), &observed.attributes)
            .await
            .unwrap();
        assert!(steps.is_empty());
    }

    #[tokio::test]
    async fn test_grant_change_is_one_put() {
        let mut wanted = desired();
        wanted.insert(
            "permissions".to_string(),
            serde_json::from_value(json!([
                {"permission": "BROWSE_PROJECTS", "holder_type": "anyone"}
            ]))
            .unwrap(),
        );
        let steps = handler(&Arc::new(MockTransport::new()))
            .update_steps("10011", &wanted, &desired())
            .await
            .unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].request.path, "/rest/api/3/permissionscheme/10011");
    }
}
