//! Groups and group membership

use serde::{Deserialize, Serialize};

/// One value of `GET /rest/api/3/group/bulk`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Group {
    #[serde(rename = "groupId", default)]
    pub group_id: Option<String>,
    pub name: String,
}

/// `POST /rest/api/3/group`
#[derive(Debug, Clone, Serialize)]
pub struct GroupCreateRequest {
    pub name: String,
}

/// One value of `GET /rest/api/3/group/member`
#[derive(Debug, Clone, Deserialize)]
pub struct GroupMember {
    #[serde(rename = "accountId")]
    pub account_id: String,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// `POST /rest/api/3/group/user?groupname=`
#[derive(Debug, Clone, Serialize)]
pub struct AddMemberRequest {
    #[serde(rename = "accountId")]
    pub account_id: String,
}
