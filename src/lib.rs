//! Jiraform - declarative reconciliation of Jira configuration
//!
//! Jiraform keeps Jira Cloud administration objects (projects, components,
//! schemes, issue types, custom fields, automation rules, groups and group
//! membership) in line with a YAML manifest. Each managed instance is created,
//! read, updated and deleted through a per-kind policy descriptor, and the
//! last known remote state is kept in a local JSON state file.
//!
//! # Architecture
//!
//! - **jira_rest** (workspace crate): HTTP transport, API errors, rate-limit
//!   retry and pagination
//! - **scope**: global vs project-scoped classification of payloads
//! - **resolver**: id or name lookup of existing entities
//! - **models**: typed wire records
//! - **reconciler**: descriptors, per-kind handlers and the lifecycle engine
//! - **host**: manifest, state file, planner and applier
//! - **config**: credentials, client tuning and state location

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod models;
pub mod reconciler;
pub mod resolver;
pub mod scope;

pub use error::{ErrorClass, JiraformError, Result};
