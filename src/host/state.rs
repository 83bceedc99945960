//! State file
//!
//! JSON map from address to the last known [`InstanceRecord`]. Written
//! after every instance so an interrupted apply loses at most one result.

use super::manifest::Address;
use crate::reconciler::InstanceRecord;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const STATE_VERSION: u32 = 1;

fn default_version() -> u32 {
    STATE_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub instances: BTreeMap<Address, InstanceRecord>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: None,
            instances: BTreeMap::new(),
        }
    }
}

impl State {
    /// Load the state file; a missing file is an empty state
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No state file, starting empty");
            return Ok(Self::default());
        }

        let state: State = serde_json::from_str(&fs::read_to_string(path)?)?;
        tracing::debug!(
            path = %path.display(),
            instances = state.instances.len(),
            "State loaded"
        );
        Ok(state)
    }

    /// Write via a sibling temp file so a crash never leaves a torn file
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        self.updated_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&InstanceRecord> {
        self.instances.get(address)
    }

    pub fn insert(&mut self, address: Address, record: InstanceRecord) {
        self.instances.insert(address, record);
    }

    pub fn remove(&mut self, address: &Address) -> Option<InstanceRecord> {
        self.instances.remove(address)
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
