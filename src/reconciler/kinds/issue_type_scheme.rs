//! Issue type schemes
//!
//! Member issue types must be global. Every referenced id is classified
//! before any mutation is sent, and all scoped ids are reported together.

use super::{any_changed, non_empty};
use crate::error::{JiraformError, Result};
use crate::models::{
    IssueTypeIdsRequest, IssueTypeScheme, IssueTypeSchemeCreateRequest, IssueTypeSchemeMapping,
    IssueTypeSchemeUpdateRequest,
};
use crate::reconciler::descriptor::{InstanceKey, ResourceKind};
use crate::reconciler::handler::{expect_id, Observed, ResourceHandler, UpdateStep};
use crate::reconciler::record::{decode_attributes, encode_attributes, Attributes};
use crate::resolver::{Lookup, LookupKind, Resolver};
use crate::scope::is_scoped;
use async_trait::async_trait;
use jira_rest::{encode_segment, ApiRequest, JiraClient};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

const KIND: ResourceKind = ResourceKind::IssueTypeScheme;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct IssueTypeSchemeAttrs {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_issue_type_id: Option<String>,
    #[serde(default)]
    issue_type_ids: Vec<String>,
}

impl IssueTypeSchemeAttrs {
    /// Members plus the default, deduplicated, in first-seen order
    fn referenced_ids(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.issue_type_ids
            .iter()
            .chain(self.default_issue_type_id.iter())
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }
}

pub struct IssueTypeSchemeHandler {
    client: JiraClient,
    resolver: Resolver,
}

impl IssueTypeSchemeHandler {
    pub fn new(client: JiraClient) -> Self {
        Self {
            resolver: Resolver::new(client.clone()),
            client,
        }
    }

    fn scheme_path(id: &str) -> String {
        format!("/rest/api/3/issuetypescheme/{}", encode_segment(id))
    }

    /// Reject project-scoped issue types, listing every offender
    async fn ensure_global(&self, attrs: &IssueTypeSchemeAttrs) -> Result<()> {
        let mut scoped = Vec::new();
        for id in attrs.referenced_ids() {
            let detail = self
                .resolver
                .resolve(LookupKind::IssueType, &Lookup::ById(id.clone()))
                .await?;
            if is_scoped(&detail) {
                debug!(issue_type = %id, "Referenced issue type is project-scoped");
                scoped.push(id);
            }
        }

        if scoped.is_empty() {
            Ok(())
        } else {
            Err(JiraformError::ScopedReference {
                kind: KIND.to_string(),
                ids: scoped,
            })
        }
    }

    async fn member_ids(&self, id: &str) -> Result<Vec<String>> {
        let request =
            ApiRequest::get("/rest/api/3/issuetypescheme/mapping").query("issueTypeSchemeId", id);
        let mappings: Vec<IssueTypeSchemeMapping> = self.client.fetch_all_pages(&request).await?;
        Ok(mappings
            .into_iter()
            .filter(|m| m.issue_type_scheme_id == id)
            .map(|m| m.issue_type_id)
            .collect())
    }
}

#[async_trait]
impl ResourceHandler for IssueTypeSchemeHandler {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create_request(&self, desired: &Attributes) -> Result<ApiRequest> {
        let attrs: IssueTypeSchemeAttrs = decode_attributes(KIND, desired)?;
        if attrs.issue_type_ids.is_empty() {
            return Err(JiraformError::invalid(
                KIND.tag(),
                "issue_type_ids must name at least one issue type",
            ));
        }
        self.ensure_global(&attrs).await?;

        let body = IssueTypeSchemeCreateRequest {
            name: attrs.name,
            issue_type_ids: attrs.issue_type_ids,
            description: attrs.description,
            default_issue_type_id: attrs.default_issue_type_id,
        };
        Ok(ApiRequest::post("/rest/api/3/issuetypescheme").json(&body)?)
    }

    async fn read(&self, key: &InstanceKey) -> Result<Option<Observed>> {
        let id = expect_id(KIND, key)?;
        let request = ApiRequest::get("/rest/api/3/issuetypescheme").query("id", id.as_str());
        let schemes: Vec<IssueTypeScheme> = self.client.fetch_all_pages(&request).await?;

        let Some(scheme) = schemes.into_iter().find(|s| s.id == id) else {
            return Ok(None);
        };

        let observed = IssueTypeSchemeAttrs {
            issue_type_ids: self.member_ids(&scheme.id).await?,
            name: scheme.name,
            description: non_empty(scheme.description),
            default_issue_type_id: scheme.default_issue_type_id,
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
        let attrs: IssueTypeSchemeAttrs = decode_attributes(KIND, desired)?;
        let current: IssueTypeSchemeAttrs = decode_attributes(KIND, observed)?;

        let have: BTreeSet<&String> = current.issue_type_ids.iter().collect();
        let want: BTreeSet<&String> = attrs.issue_type_ids.iter().collect();
        let added: Vec<String> = attrs
            .issue_type_ids
            .iter()
            .filter(|id| !have.contains(id))
            .cloned()
            .collect();
        let removed: Vec<String> = current
            .issue_type_ids
            .iter()
            .filter(|id| !want.contains(id))
            .cloned()
            .collect();
        let details_changed =
            any_changed(desired, observed, &["name", "description", "default_issue_type_id"]);

        if added.is_empty() && removed.is_empty() && !details_changed {
            return Ok(Vec::new());
        }
        self.ensure_global(&attrs).await?;

        let mut steps = Vec::new();
        if !added.is_empty() {
            steps.push(UpdateStep::new(
                "add issue types",
                ApiRequest::put(format!("{}/issuetype", Self::scheme_path(id)))
                    .json(&IssueTypeIdsRequest { issue_type_ids: added })?,
            ));
        }

        if details_changed {
            let body = IssueTypeSchemeUpdateRequest {
                name: attrs.name.clone(),
                description: attrs.description.clone(),
                default_issue_type_id: attrs.default_issue_type_id.clone(),
            };
            steps.push(UpdateStep::new(
                "scheme details",
                ApiRequest::put(Self::scheme_path(id)).json(&body)?,
            ));
        }

        for issue_type_id in removed {
            steps.push(UpdateStep::new(
                format!("remove issue type {}", issue_type_id),
                ApiRequest::delete(format!(
                    "{}/issuetype/{}",
                    Self::scheme_path(id),
                    encode_segment(&issue_type_id)
                )),
            ));
        }

        Ok(steps)
    }

    fn delete_request(&self, key: &InstanceKey) -> Result<ApiRequest> {
        Ok(ApiRequest::delete(Self::scheme_path(&expect_id(KIND, key)?)))
    }
}
