//! Groups
//!
//! Addressed by name. Jira cannot rename a group, so a name change is
//! carried out by the engine as delete-then-create.

use crate::error::{JiraformError, Result};
use crate::models::{Group, GroupCreateRequest};
use crate::reconciler::descriptor::{InstanceKey, ResourceKind};
use crate::reconciler::handler::{Observed, ResourceHandler, UpdateStep};
use crate::reconciler::record::{decode_attributes, encode_attributes, Attributes};
use crate::resolver::{Lookup, LookupKind, Resolver};
use async_trait::async_trait;
use jira_rest::{ApiRequest, JiraClient};
use serde::{Deserialize, Serialize};

const KIND: ResourceKind = ResourceKind::Group;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupAttrs {
    name: String,
}

pub struct GroupHandler {
    resolver: Resolver,
}

impl GroupHandler {
    pub fn new(client: JiraClient) -> Self {
        Self {
            resolver: Resolver::new(client),
        }
    }
}

fn group_name(key: &InstanceKey) -> Result<&str> {
    match key {
        InstanceKey::Natural(name) | InstanceKey::Id(name) => Ok(name.as_str()),
        other => Err(JiraformError::ContractViolation(format!(
            "{} is addressed by name, got key '{}'",
            KIND, other
        ))),
    }
}

#[async_trait]
impl ResourceHandler for GroupHandler {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create_request(&self, desired: &Attributes) -> Result<ApiRequest> {
        let attrs: GroupAttrs = decode_attributes(KIND, desired)?;
        Ok(ApiRequest::post("/rest/api/3/group").json(&GroupCreateRequest { name: attrs.name })?)
    }

    async fn read(&self, key: &InstanceKey) -> Result<Option<Observed>> {
        let name = group_name(key)?;
        let group: Group = match self
            .resolver
            .resolve_as(LookupKind::Group, &Lookup::ByName(name.to_string()))
            .await
        {
            Ok(group) => group,
            Err(JiraformError::NotFoundByName { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let attributes = encode_attributes(&GroupAttrs {
            name: group.name.clone(),
        })?;
        Ok(Some(Observed {
            id: group.group_id.unwrap_or(group.name),
            attributes,
        }))
    }

    async fn update_steps(
        &self,
        _id: &str,
        _desired: &Attributes,
        _observed: &Attributes,
    ) -> Result<Vec<UpdateStep>> {
        Ok(Vec::new())
    }

    fn delete_request(&self, key: &InstanceKey) -> Result<ApiRequest> {
        Ok(ApiRequest::delete("/rest/api/3/group").query("groupname", group_name(key)?))
    }
}
