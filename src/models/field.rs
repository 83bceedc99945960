//! Custom fields

use serde::{Deserialize, Serialize};

/// Field type information
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type", default)]
    pub schema_type: Option<String>,
    /// Custom field type key, e.g. `com.atlassian.jira.plugin.system.customfieldtypes:textfield`
    #[serde(default)]
    pub custom: Option<String>,
}

/// One value of `GET /rest/api/3/field/search`
#[derive(Debug, Clone, Deserialize)]
pub struct CustomField {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Option<FieldSchema>,
    #[serde(rename = "searcherKey", default)]
    pub searcher_key: Option<String>,
}

impl CustomField {
    pub fn field_type(&self) -> Option<&str> {
        self.schema.as_ref().and_then(|s| s.custom.as_deref())
    }
}

/// `POST /rest/api/3/field`
#[derive(Debug, Clone, Serialize)]
pub struct CustomFieldCreateRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(rename = "searcherKey")]
    pub searcher_key: String,
}

/// `PUT /rest/api/3/field/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct CustomFieldUpdateRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
