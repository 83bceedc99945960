//! Scope classification
//!
//! Jira marks project-scoped (next-gen/team-managed) entities by including a
//! `scope` object in their payload; global (classic) entities omit the key.
//! The resolver and the issue type scheme validation both go through
//! [`is_scoped`], and nothing caches its answer: scope is always read from the
//! payload that was just fetched.

use serde_json::Value;

/// True iff the payload is an object containing a `scope` key, whatever its value
pub fn is_scoped(payload: &Value) -> bool {
    payload
        .as_object()
        .is_some_and(|object| object.contains_key("scope"))
}
