//! Desired-state manifest
//!
//! ```yaml
//! resources:
//!   - kind: group
//!     name: admins
//!     attributes:
//!       name: ops-admins
//!   - kind: group_membership
//!     name: admins-alice
//!     attributes:
//!       group_name: ops-admins
//!       account_id: 5b10a2844c20165700ede21g
//! ```

use crate::reconciler::{Attributes, ResourceKind};
use crate::{JiraformError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Local address of a managed instance: `<kind>.<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub kind: ResourceKind,
    pub name: String,
}

impl Address {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}

impl FromStr for Address {
    type Err = JiraformError;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, name) = s
            .split_once('.')
            .filter(|(_, name)| !name.is_empty())
            .ok_or_else(|| {
                JiraformError::Config(format!("Invalid address '{}': expected <kind>.<name>", s))
            })?;
        Ok(Address::new(kind.parse()?, name))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One desired instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl ResourceSpec {
    pub fn address(&self) -> Address {
        Address::new(self.kind, self.name.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(JiraformError::Config(format!(
                "Manifest not found: {}",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), "Loading manifest");
        let manifest = Self::parse(&fs::read_to_string(path)?)?;
        tracing::debug!(resources = manifest.resources.len(), "Manifest loaded");
        Ok(manifest)
    }

    /// Names must be non-empty, dot-free and unique per kind
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for spec in &self.resources {
            if spec.name.trim().is_empty() || spec.name.contains('.') {
                return Err(JiraformError::Config(format!(
                    "Invalid {} name '{}': names must be non-empty and contain no '.'",
                    spec.kind, spec.name
                )));
            }
            if !seen.insert(spec.address()) {
                return Err(JiraformError::Config(format!(
                    "Duplicate resource address '{}'",
                    spec.address()
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&ResourceSpec> {
        self.resources
            .iter()
            .find(|spec| spec.kind == address.kind && spec.name == address.name)
    }
}
