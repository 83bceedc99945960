//! Identifier resolution
//!
//! Turns a user-supplied id or name into exactly one remote entity. Lookups
//! are read-only; the per-kind endpoints live in [`table`].

mod table;

pub use table::{IdFetch, LookupKind, LookupSpec, NameMatch, NameSearch, Shape};

use crate::error::{JiraformError, Result};
use crate::scope::is_scoped;
use jira_rest::{encode_segment, ApiRequest, JiraClient};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

/// A lookup hint: exactly one of id or name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    ById(String),
    ByName(String),
}

impl Lookup {
    /// Build a hint from two optional inputs; empty strings count as absent.
    ///
    /// Both or neither is an [`JiraformError::AmbiguousInput`].
    pub fn from_hints(id: Option<&str>, name: Option<&str>) -> Result<Self> {
        let id = id.map(str::trim).filter(|s| !s.is_empty());
        let name = name.map(str::trim).filter(|s| !s.is_empty());

        match (id, name) {
            (Some(id), None) => Ok(Lookup::ById(id.to_string())),
            (None, Some(name)) => Ok(Lookup::ByName(name.to_string())),
            (Some(_), Some(_)) => Err(JiraformError::AmbiguousInput(
                "id and name are mutually exclusive; specify only one".to_string(),
            )),
            (None, None) => Err(JiraformError::AmbiguousInput(
                "either id or name must be specified".to_string(),
            )),
        }
    }
}

/// Resolves lookup hints against the Jira API
#[derive(Clone)]
pub struct Resolver {
    client: JiraClient,
}

impl Resolver {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    /// Resolve from raw id/name inputs, rejecting ambiguous input before any request
    pub async fn resolve_hints(
        &self,
        kind: LookupKind,
        id: Option<&str>,
        name: Option<&str>,
    ) -> Result<Value> {
        let lookup = Lookup::from_hints(id, name)?;
        self.resolve(kind, &lookup).await
    }

    /// Resolve to the raw entity payload
    pub async fn resolve(&self, kind: LookupKind, lookup: &Lookup) -> Result<Value> {
        info!(kind = %kind, lookup = ?lookup, "Resolving");
        match lookup {
            Lookup::ById(id) => self.resolve_by_id(kind, id).await,
            Lookup::ByName(name) => self.resolve_by_name(kind, name).await,
        }
    }

    /// Resolve and decode into a typed record
    pub async fn resolve_as<T: DeserializeOwned>(
        &self,
        kind: LookupKind,
        lookup: &Lookup,
    ) -> Result<T> {
        let value = self.resolve(kind, lookup).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn resolve_by_id(&self, kind: LookupKind, id: &str) -> Result<Value> {
        let spec = kind.spec();
        let not_found = || JiraformError::NotFoundById {
            kind: spec.label.to_string(),
            id: id.to_string(),
        };

        let fetch = spec.by_id.ok_or_else(|| {
            JiraformError::ContractViolation(format!("{} cannot be looked up by id", spec.label))
        })?;

        let result = match fetch {
            IdFetch::Path(prefix) => {
                let request = ApiRequest::get(format!("{}/{}", prefix, encode_segment(id)));
                self.client.fetch_value(&request).await.map(|v| vec![v])
            }
            IdFetch::Query { path, param, shape } => {
                let request = ApiRequest::get(path).query(param, id);
                return match self.fetch_list(&request, shape).await {
                    Ok(items) => items.into_iter().next().ok_or_else(not_found),
                    Err(e) if e.is_not_found() => Err(not_found()),
                    Err(e) => Err(e),
                };
            }
        };

        match result {
            Ok(mut items) => items.pop().ok_or_else(not_found),
            Err(e) if jira_rest::is_not_found(&e) => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_by_name(&self, kind: LookupKind, name: &str) -> Result<Value> {
        let spec = kind.spec();
        let search = spec.by_name;

        let mut request = ApiRequest::get(search.path);
        if let Some(param) = search.param {
            request = request.query(param, name);
        }
        let listing = self.fetch_list(&request, search.shape).await?;

        let candidates: Vec<Value> = match search.matching {
            NameMatch::FirstResult => listing.into_iter().take(1).collect(),
            NameMatch::ExactIgnoreCase => listing
                .into_iter()
                .filter(|item| {
                    item.pointer(spec.name_pointer)
                        .and_then(Value::as_str)
                        .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
                })
                .collect(),
        };

        debug!(kind = %kind, name = %name, candidates = candidates.len(), "Name search finished");

        if candidates.is_empty() {
            return Err(JiraformError::NotFoundByName {
                kind: spec.label.to_string(),
                name: name.to_string(),
            });
        }

        if spec.scope_aware {
            return self.select_global(kind, name, candidates).await;
        }

        candidates.into_iter().next().ok_or_else(|| JiraformError::NotFoundByName {
            kind: spec.label.to_string(),
            name: name.to_string(),
        })
    }

    /// First candidate whose full detail is unscoped; fetch failures are skipped
    async fn select_global(
        &self,
        kind: LookupKind,
        name: &str,
        candidates: Vec<Value>,
    ) -> Result<Value> {
        let spec = kind.spec();
        let total = candidates.len();

        for candidate in candidates {
            if is_scoped(&candidate) {
                continue;
            }
            let Some(id) = candidate.pointer(spec.id_pointer).and_then(value_as_id) else {
                continue;
            };
            match self.resolve_by_id(kind, &id).await {
                Ok(detail) if !is_scoped(&detail) => return Ok(detail),
                Ok(_) => debug!(kind = %kind, id = %id, "Candidate is project-scoped"),
                Err(e) => debug!(kind = %kind, id = %id, error = %e, "Skipping candidate"),
            }
        }

        Err(JiraformError::NoEligibleMatch {
            kind: spec.label.to_string(),
            name: name.to_string(),
            candidates: total,
        })
    }

    async fn fetch_list(&self, request: &ApiRequest, shape: Shape) -> Result<Vec<Value>> {
        let items = match shape {
            Shape::Paged => self.client.fetch_all_pages(request).await?,
            Shape::Array => self.client.fetch(request).await?,
            Shape::Object => vec![self.client.fetch_value(request).await?],
            Shape::Wrapped(key) => match self.client.fetch_value(request).await? {
                Value::Object(mut wrapper) => match wrapper.remove(key) {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            },
        };
        Ok(items)
    }
}

/// String form of a JSON id (string or number)
pub(crate) fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
