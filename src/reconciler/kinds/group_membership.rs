//! Group membership
//!
//! One instance per (group, account) pair. There is nothing to update in
//! place; a changed pair is a different instance.

use crate::error::{JiraformError, Result};
use crate::models::{AddMemberRequest, GroupMember};
use crate::reconciler::descriptor::{InstanceKey, ResourceKind};
use crate::reconciler::handler::{Observed, ResourceHandler, UpdateStep};
use crate::reconciler::record::{decode_attributes, encode_attributes, Attributes};
use async_trait::async_trait;
use jira_rest::{ApiRequest, JiraClient};
use serde::{Deserialize, Serialize};
use tracing::debug;

const KIND: ResourceKind = ResourceKind::GroupMembership;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct MembershipAttrs {
    group_name: String,
    account_id: String,
}

pub struct GroupMembershipHandler {
    client: JiraClient,
}

impl GroupMembershipHandler {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }
}

fn membership(key: &InstanceKey) -> Result<(&str, &str)> {
    match key {
        InstanceKey::Composite(parts) if parts.len() == 2 => Ok((parts[0].as_str(), parts[1].as_str())),
        other => Err(JiraformError::ContractViolation(format!(
            "{} is addressed by group_name/account_id, got key '{}'",
            KIND, other
        ))),
    }
}

#[async_trait]
impl ResourceHandler for GroupMembershipHandler {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create_request(&self, desired: &Attributes) -> Result<ApiRequest> {
        let attrs: MembershipAttrs = decode_attributes(KIND, desired)?;
        Ok(ApiRequest::post("/rest/api/3/group/user")
            .query("groupname", attrs.group_name)
            .json(&AddMemberRequest {
                account_id: attrs.account_id,
            })?)
    }

    /// Pages through the whole member list; a member past the first page
    /// still counts as present
    async fn read(&self, key: &InstanceKey) -> Result<Option<Observed>> {
        let (group_name, account_id) = membership(key)?;
        let request = ApiRequest::get("/rest/api/3/group/member")
            .query("groupname", group_name)
            .query("includeInactiveUsers", "true");
        let members: Vec<GroupMember> = self.client.fetch_all_pages(&request).await?;
        debug!(group = %group_name, members = members.len(), "Fetched group members");

        if !members.iter().any(|m| m.account_id == account_id) {
            return Ok(None);
        }

        let attrs = MembershipAttrs {
            group_name: group_name.to_string(),
            account_id: account_id.to_string(),
        };
        Ok(Some(Observed {
            id: key.as_id(),
            attributes: encode_attributes(&attrs)?,
        }))
    }

    async fn update_steps(
        &self,
        _id: &str,
        _desired: &Attributes,
        _observed: &Attributes,
    ) -> Result<Vec<UpdateStep>> {
        Err(JiraformError::ContractViolation(format!(
            "{} instances cannot be updated in place",
            KIND
        )))
    }

    fn delete_request(&self, key: &InstanceKey) -> Result<ApiRequest> {
        let (group_name, account_id) = membership(key)?;
        Ok(ApiRequest::delete("/rest/api/3/group/user")
            .query("groupname", group_name)
            .query("accountId", account_id))
    }
}
