//! Per-kind handlers
//!
//! One module per managed resource kind. [`handler_for`] is the dispatch
//! table from kind to handler.

mod automation_rule;
mod custom_field;
mod group;
mod group_membership;
mod issue_type;
mod issue_type_scheme;
mod permission_scheme;
mod project;
mod project_component;
mod workflow_scheme;

pub use automation_rule::AutomationRuleHandler;
pub use custom_field::CustomFieldHandler;
pub use group::GroupHandler;
pub use group_membership::GroupMembershipHandler;
pub use issue_type::IssueTypeHandler;
pub use issue_type_scheme::IssueTypeSchemeHandler;
pub use permission_scheme::PermissionSchemeHandler;
pub use project::ProjectHandler;
pub use project_component::ProjectComponentHandler;
pub use workflow_scheme::WorkflowSchemeHandler;

use super::descriptor::ResourceKind;
use super::handler::ResourceHandler;
use super::record::Attributes;
use jira_rest::JiraClient;

/// Build the handler for `kind` around a shared client
pub fn handler_for(kind: ResourceKind, client: JiraClient) -> Box<dyn ResourceHandler> {
    match kind {
        ResourceKind::Project => Box::new(ProjectHandler::new(client)),
        ResourceKind::ProjectComponent => Box::new(ProjectComponentHandler::new(client)),
        ResourceKind::WorkflowScheme => Box::new(WorkflowSchemeHandler::new(client)),
        ResourceKind::PermissionScheme => Box::new(PermissionSchemeHandler::new(client)),
        ResourceKind::IssueType => Box::new(IssueTypeHandler::new(client)),
        ResourceKind::IssueTypeScheme => Box::new(IssueTypeSchemeHandler::new(client)),
        ResourceKind::CustomField => Box::new(CustomFieldHandler::new(client)),
        ResourceKind::AutomationRule => Box::new(AutomationRuleHandler::new(client)),
        ResourceKind::Group => Box::new(GroupHandler::new(client)),
        ResourceKind::GroupMembership => Box::new(GroupMembershipHandler::new(client)),
    }
}

/// True if any of `fields` is set in `desired` with a value `observed` lacks
pub(crate) fn any_changed(desired: &Attributes, observed: &Attributes, fields: &[&str]) -> bool {
    fields.iter().any(|field| match desired.get(*field) {
        Some(want) => observed.get(*field) != Some(want),
        None => false,
    })
}

/// Treat empty strings from the API as absent
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
