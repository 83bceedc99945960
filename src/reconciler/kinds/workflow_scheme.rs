//! Workflow schemes

use super::{any_changed, non_empty};
use crate::error::Result;
use crate::models::{WorkflowScheme, WorkflowSchemeRequest};
use crate::reconciler::descriptor::{InstanceKey, ResourceKind};
use crate::reconciler::handler::{expect_id, Observed, ResourceHandler, UpdateStep};
use crate::reconciler::record::{decode_attributes, encode_attributes, Attributes};
use async_trait::async_trait;
use jira_rest::{encode_segment, ApiRequest, JiraClient};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const KIND: ResourceKind = ResourceKind::WorkflowScheme;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkflowSchemeAttrs {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_workflow: Option<String>,
    /// Issue type id to workflow name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    issue_type_mappings: BTreeMap<String, String>,
}

impl From<WorkflowSchemeAttrs> for WorkflowSchemeRequest {
    fn from(attrs: WorkflowSchemeAttrs) -> Self {
        WorkflowSchemeRequest {
            name: attrs.name,
            description: attrs.description,
            default_workflow: attrs.default_workflow,
            issue_type_mappings: attrs.issue_type_mappings,
        }
    }
}

pub struct WorkflowSchemeHandler {
    client: JiraClient,
}

impl WorkflowSchemeHandler {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    fn scheme_path(id: &str) -> String {
        format!("/rest/api/3/workflowscheme/{}", encode_segment(id))
    }
}

#[async_trait]
impl ResourceHandler for WorkflowSchemeHandler {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create_request(&self, desired: &Attributes) -> Result<ApiRequest> {
        let attrs: WorkflowSchemeAttrs = decode_attributes(KIND, desired)?;
        Ok(ApiRequest::post("/rest/api/3/workflowscheme").json(&WorkflowSchemeRequest::from(attrs))?)
    }

    async fn read(&self, key: &InstanceKey) -> Result<Option<Observed>> {
        let id = expect_id(KIND, key)?;
        let scheme: WorkflowScheme = self
            .client
            .fetch(&ApiRequest::get(Self::scheme_path(&id)))
            .await?;

        let observed = WorkflowSchemeAttrs {
            name: scheme.name,
            description: non_empty(scheme.description),
            default_workflow: non_empty(scheme.default_workflow),
            issue_type_mappings: scheme.issue_type_mappings,
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
        if !any_changed(
            desired,
            observed,
            &["name", "description", "default_workflow", "issue_type_mappings"],
        ) {
            return Ok(Vec::new());
        }

        let attrs: WorkflowSchemeAttrs = decode_attributes(KIND, desired)?;
        Ok(vec![UpdateStep::new(
            "workflow scheme details",
            ApiRequest::put(Self::scheme_path(id)).json(&WorkflowSchemeRequest::from(attrs))?,
        )])
    }

    fn delete_request(&self, key: &InstanceKey) -> Result<ApiRequest> {
        Ok(ApiRequest::delete(Self::scheme_path(&expect_id(KIND, key)?)))
    }
}
