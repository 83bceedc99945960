//! Instance records and attribute values
//!
//! Attributes are the host-facing shape of an instance. Handlers convert
//! them to and from typed records with [`decode_attributes`] and
//! [`encode_attributes`].

use super::descriptor::ResourceKind;
use crate::error::{JiraformError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single attribute value
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

/// Name to value, ordered by name
pub type Attributes = BTreeMap<String, AttrValue>;

/// One managed entity: its id plus the last applied and observed attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub kind: ResourceKind,
    /// Empty until create completes
    #[serde(default)]
    pub id: String,
    /// Desired attributes as of the last successful apply
    #[serde(default)]
    pub applied: Attributes,
    /// Remote truth as of the last read
    #[serde(default)]
    pub observed: Attributes,
}

impl InstanceRecord {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            id: String::new(),
            applied: Attributes::new(),
            observed: Attributes::new(),
        }
    }
}

/// Decode attributes into a typed record for `kind`
pub fn decode_attributes<T: DeserializeOwned>(kind: ResourceKind, attributes: &Attributes) -> Result<T> {
    let value = serde_json::to_value(attributes)?;
    serde_json::from_value(value).map_err(|e| JiraformError::invalid(kind.tag(), e.to_string()))
}

/// Encode a typed record as attributes; `null` values are dropped
pub fn encode_attributes<T: Serialize>(record: &T) -> Result<Attributes> {
    match strip_nulls(serde_json::to_value(record)?) {
        Value::Object(map) => {
            let mut attributes = Attributes::new();
            for (name, value) in map {
                attributes.insert(name, serde_json::from_value(value)?);
            }
            Ok(attributes)
        }
        other => Err(JiraformError::ContractViolation(format!(
            "attributes must encode as an object, got {}",
            other
        ))),
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(strip_nulls)
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
pub(crate) fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), AttrValue::from(*v)))
        .collect()
}
