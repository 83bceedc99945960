//! Per-kind lookup descriptors
//!
//! Each lookup kind names its endpoints and response shapes here so the
//! resolver itself stays kind-agnostic.

use std::fmt;
use std::str::FromStr;

/// How a listing endpoint wraps its items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// The response is the entity itself
    Object,
    /// A bare JSON array
    Array,
    /// The paged `{startAt, total, isLast, values}` envelope
    Paged,
    /// An object holding the items under a kind-specific key
    Wrapped(&'static str),
}

/// How to fetch one entity by id
#[derive(Debug, Clone, Copy)]
pub enum IdFetch {
    /// `GET {prefix}/{id}`
    Path(&'static str),
    /// `GET {path}?{param}={id}`
    Query {
        path: &'static str,
        param: &'static str,
        shape: Shape,
    },
}

/// How candidates for a name are chosen from a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    /// Case-insensitive equality on the name field
    ExactIgnoreCase,
    /// The server already filtered; take the first result
    FirstResult,
}

/// How to search by name
#[derive(Debug, Clone, Copy)]
pub struct NameSearch {
    pub path: &'static str,
    /// Query parameter carrying the name; `None` lists everything
    pub param: Option<&'static str>,
    pub shape: Shape,
    pub matching: NameMatch,
}

/// Static description of one lookup kind
#[derive(Debug)]
pub struct LookupSpec {
    pub label: &'static str,
    pub by_id: Option<IdFetch>,
    pub by_name: NameSearch,
    /// JSON pointer to the name within a listing item
    pub name_pointer: &'static str,
    /// JSON pointer to the id within a listing item
    pub id_pointer: &'static str,
    /// Name matches are filtered down to global (unscoped) entities
    pub scope_aware: bool,
}

/// Entity kinds the resolver can look up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Group,
    IssueType,
    IssueTypeScheme,
    PermissionScheme,
    Workflow,
    User,
}

const GROUP: LookupSpec = LookupSpec {
    label: "group",
    by_id: Some(IdFetch::Query {
        path: "/rest/api/3/group/bulk",
        param: "groupId",
        shape: Shape::Paged,
    }),
    by_name: NameSearch {
        path: "/rest/api/3/group/bulk",
        param: Some("groupName"),
        shape: Shape::Paged,
        matching: NameMatch::ExactIgnoreCase,
    },
    name_pointer: "/name",
    id_pointer: "/groupId",
    scope_aware: false,
};

const ISSUE_TYPE: LookupSpec = LookupSpec {
    label: "issue type",
    by_id: Some(IdFetch::Path("/rest/api/3/issuetype")),
    by_name: NameSearch {
        path: "/rest/api/3/issuetype",
        param: None,
        shape: Shape::Array,
        matching: NameMatch::ExactIgnoreCase,
    },
    name_pointer: "/name",
    id_pointer: "/id",
    scope_aware: true,
};

const ISSUE_TYPE_SCHEME: LookupSpec = LookupSpec {
    label: "issue type scheme",
    by_id: Some(IdFetch::Query {
        path: "/rest/api/3/issuetypescheme",
        param: "id",
        shape: Shape::Paged,
    }),
    by_name: NameSearch {
        path: "/rest/api/3/issuetypescheme",
        param: None,
        shape: Shape::Paged,
        matching: NameMatch::ExactIgnoreCase,
    },
    name_pointer: "/name",
    id_pointer: "/id",
    scope_aware: false,
};

const PERMISSION_SCHEME: LookupSpec = LookupSpec {
    label: "permission scheme",
    by_id: Some(IdFetch::Path("/rest/api/3/permissionscheme")),
    by_name: NameSearch {
        path: "/rest/api/3/permissionscheme",
        param: None,
        shape: Shape::Wrapped("permissionSchemes"),
        matching: NameMatch::ExactIgnoreCase,
    },
    name_pointer: "/name",
    id_pointer: "/id",
    scope_aware: false,
};

const WORKFLOW: LookupSpec = LookupSpec {
    label: "workflow",
    by_id: None,
    by_name: NameSearch {
        path: "/rest/api/3/workflow/search",
        param: Some("workflowName"),
        shape: Shape::Paged,
        matching: NameMatch::ExactIgnoreCase,
    },
    name_pointer: "/id/name",
    id_pointer: "/id/entityId",
    scope_aware: false,
};

const USER: LookupSpec = LookupSpec {
    label: "user",
    by_id: Some(IdFetch::Query {
        path: "/rest/api/3/user",
        param: "accountId",
        shape: Shape::Object,
    }),
    by_name: NameSearch {
        path: "/rest/api/3/user/search",
        param: Some("query"),
        shape: Shape::Array,
        matching: NameMatch::FirstResult,
    },
    name_pointer: "/emailAddress",
    id_pointer: "/accountId",
    scope_aware: false,
};

impl LookupKind {
    pub const ALL: [LookupKind; 6] = [
        LookupKind::Group,
        LookupKind::IssueType,
        LookupKind::IssueTypeScheme,
        LookupKind::PermissionScheme,
        LookupKind::Workflow,
        LookupKind::User,
    ];

    pub fn spec(self) -> &'static LookupSpec {
        match self {
            LookupKind::Group => &GROUP,
            LookupKind::IssueType => &ISSUE_TYPE,
            LookupKind::IssueTypeScheme => &ISSUE_TYPE_SCHEME,
            LookupKind::PermissionScheme => &PERMISSION_SCHEME,
            LookupKind::Workflow => &WORKFLOW,
            LookupKind::User => &USER,
        }
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    /// Manifest/CLI spelling, e.g. `issue_type_scheme`
    pub fn tag(self) -> &'static str {
        match self {
            LookupKind::Group => "group",
            LookupKind::IssueType => "issue_type",
            LookupKind::IssueTypeScheme => "issue_type_scheme",
            LookupKind::PermissionScheme => "permission_scheme",
            LookupKind::Workflow => "workflow",
            LookupKind::User => "user",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for LookupKind {
    type Err = crate::JiraformError;

    fn from_str(s: &str) -> crate::Result<Self> {
        LookupKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| {
                crate::JiraformError::Config(format!(
                    "Unknown lookup kind '{}'. Must be one of: {}",
                    s,
                    LookupKind::ALL.map(|k| k.tag()).join(", ")
                ))
            })
    }
}
