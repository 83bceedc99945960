//! Integration tests for the reconciler engine
//!
//! Every test scripts the Jira API with the in-memory transport and drives
//! one lifecycle call end to end.

use jira_rest::mock::MockTransport;
use jira_rest::{JiraClient, Method, RawResponse, RetryConfig};
use jiraform::reconciler::{AttrValue, Attributes, Reconciler, ResourceKind};
use jiraform::{ErrorClass, JiraformError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn ok(body: Value) -> RawResponse {
    RawResponse::new(200, body.to_string())
}

fn no_content() -> RawResponse {
    RawResponse::new(204, "")
}

fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), AttrValue::from(*v)))
        .collect()
}

fn reconciler(kind: ResourceKind, mock: &Arc<MockTransport>) -> Reconciler {
    Reconciler::new(kind, JiraClient::new(mock.clone()))
}

fn group_bulk(name: &str, group_id: &str) -> RawResponse {
    ok(json!({
        "startAt": 0, "maxResults": 50, "total": 1, "isLast": true,
        "values": [{"groupId": group_id, "name": name}]
    }))
}

fn empty_page() -> RawResponse {
    ok(json!({"startAt": 0, "maxResults": 50, "total": 0, "isLast": true, "values": []}))
}

#[tokio::test]
async fn test_activation_failure_is_a_warning() {
    let mock = Arc::new(MockTransport::new());
    mock.on_post("/rest/v1/rule", ok(json!({"id": 42})));
    mock.on_put(
        "/rest/v1/rule/42/state",
        RawResponse::new(500, r#"{"errorMessages":["Rule could not be enabled"]}"#),
    );
    mock.on_get(
        "/rest/v1/rule/42",
        ok(json!({"id": 42, "name": "Close stale", "state": "DISABLED"})),
    );

    let desired = attrs(&[
        ("name", "Close stale"),
        ("rule_json", r#"{"trigger":{"component":"TRIGGER"}}"#),
    ]);
    let applied = reconciler(ResourceKind::AutomationRule, &mock)
        .create(&desired)
        .await
        .unwrap();

    assert_eq!(applied.id, "42");
    assert_eq!(applied.observed["state"].as_str(), Some("DISABLED"));
    assert_eq!(applied.warnings.len(), 1);
    assert!(applied.warnings[0].contains("Rule could not be enabled"));
}

#[tokio::test]
async fn test_rule_created_with_uuid_only() {
    let mock = Arc::new(MockTransport::new());
    mock.on_post("/rest/v1/rule", ok(json!({"ruleUuid": "0189-aa"})));
    mock.on_get(
        "/rest/v1/rule/0189-aa",
        ok(json!({"ruleUuid": "0189-aa", "name": "Close stale", "state": "DISABLED"})),
    );

    let mut desired = attrs(&[("name", "Close stale"), ("rule_json", "{}")]);
    desired.insert("state".to_string(), "DISABLED".into());

    let applied = reconciler(ResourceKind::AutomationRule, &mock)
        .create(&desired)
        .await
        .unwrap();
    assert_eq!(applied.id, "0189-aa");
    assert!(applied.warnings.is_empty());
    assert_eq!(mock.count_method(Method::PUT), 0);
}

#[tokio::test]
async fn test_disable_mode_never_deletes() {
    let mock = Arc::new(MockTransport::new());
    mock.on_put("/rest/v1/rule/42/state", no_content());

    reconciler(ResourceKind::AutomationRule, &mock)
        .delete("42", &Attributes::new())
        .await
        .unwrap();

    assert_eq!(mock.count_method(Method::DELETE), 0);
    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body, Some(json!({"state": "DISABLED"})));
}

#[tokio::test]
async fn test_group_rename_deletes_then_creates() {
    let mock = Arc::new(MockTransport::new());
    mock.on_delete("/rest/api/3/group", no_content());
    mock.on_post("/rest/api/3/group", ok(json!({"name": "platform", "groupId": "g2"})));
    mock.on_get_query(
        "/rest/api/3/group/bulk",
        &[("groupName", "platform")],
        group_bulk("platform", "g2"),
    );

    let applied = reconciler(ResourceKind::Group, &mock)
        .update("g1", &attrs(&[("name", "platform")]), &attrs(&[("name", "ops")]))
        .await
        .unwrap();

    assert_eq!(applied.id, "g2");
    assert_eq!(applied.observed, attrs(&[("name", "platform")]));

    let requests = mock.requests();
    assert_eq!(requests[0].method, Method::DELETE);
    assert_eq!(requests[0].query_value("groupname"), Some("ops"));
    assert_eq!(requests[1].method, Method::POST);
}

#[tokio::test]
async fn test_group_rename_partial_failure() {
    let mock = Arc::new(MockTransport::new());
    mock.on_delete("/rest/api/3/group", no_content());
    mock.on_post(
        "/rest/api/3/group",
        RawResponse::new(400, r#"{"errorMessages":["Group name is invalid"]}"#),
    );
    mock.on_get("/rest/api/3/group/bulk", empty_page());

    let rename = reconciler(ResourceKind::Group, &mock);
    let err = rename
        .update("g1", &attrs(&[("name", "bad name")]), &attrs(&[("name", "ops")]))
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::PartialFailure);
    let message = err.to_string();
    assert!(message.contains("old instance removed, new instance failed"));
    assert!(message.contains("deleted 'ops'"));

    // Both names are now absent and can be reconciled independently
    assert!(rename.read("", &attrs(&[("name", "ops")])).await.unwrap().is_none());
    assert!(rename
        .read("", &attrs(&[("name", "bad name")]))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_composite_update_fails_without_requests() {
    let mock = Arc::new(MockTransport::new());
    let err = reconciler(ResourceKind::GroupMembership, &mock)
        .update(
            "ops/u1",
            &attrs(&[("group_name", "ops"), ("account_id", "u2")]),
            &attrs(&[("group_name", "ops"), ("account_id", "u1")]),
        )
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::ContractViolation);
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_immutable_change_fails_without_requests() {
    let mock = Arc::new(MockTransport::new());
    let err = reconciler(ResourceKind::IssueType, &mock)
        .update(
            "10030",
            &attrs(&[("name", "Incident"), ("type", "subtask")]),
            &attrs(&[("name", "Incident"), ("type", "standard")]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, JiraformError::ContractViolation(ref m) if m.contains("type")));
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_update_stops_at_first_failed_step() {
    let mock = Arc::new(MockTransport::new());
    mock.on_put("/rest/api/3/project/10000", no_content());
    mock.on_put(
        "/rest/api/3/project/10000/permissionscheme",
        RawResponse::new(400, r#"{"errorMessages":["Permission scheme does not exist"]}"#),
    );

    let observed = attrs(&[
        ("key", "OPS"),
        ("name", "Operations"),
        ("project_type_key", "software"),
        ("lead_account_id", "lead-1"),
        ("permission_scheme_id", "10011"),
    ]);
    let mut desired = observed.clone();
    desired.insert("name".to_string(), "Ops".into());
    desired.insert("permission_scheme_id".to_string(), "10099".into());
    desired.insert("workflow_scheme_id".to_string(), "10200".into());

    let err = reconciler(ResourceKind::Project, &mock)
        .update("10000", &desired, &observed)
        .await
        .unwrap_err();

    match &err {
        JiraformError::UpdateFailed {
            step, completed, ..
        } => {
            assert_eq!(step, "permission scheme assignment");
            assert_eq!(completed, &vec!["project details".to_string()]);
        }
        other => panic!("expected UpdateFailed, got {other:?}"),
    }
    assert_eq!(err.class(), ErrorClass::Validation);
    assert_eq!(mock.count(Method::PUT, "/rest/api/3/workflowscheme/project"), 0);
    assert_eq!(mock.count_method(Method::GET), 0);
}

#[tokio::test]
async fn test_read_of_deleted_entity_is_absent() {
    let mock = Arc::new(MockTransport::new());
    mock.on_get(
        "/rest/api/3/project/10000",
        RawResponse::new(404, r#"{"errorMessages":["No project could be found with id '10000'."]}"#),
    );

    let observed = reconciler(ResourceKind::Project, &mock)
        .read("10000", &Attributes::new())
        .await
        .unwrap();
    assert!(observed.is_none());
}

#[tokio::test]
async fn test_create_read_back_miss_is_partial_failure() {
    let mock = Arc::new(MockTransport::new());
    mock.on_post("/rest/api/3/component", ok(json!({"id": "10050"})));
    mock.on_get("/rest/api/3/component/10050", RawResponse::new(404, ""));

    let err = reconciler(ResourceKind::ProjectComponent, &mock)
        .create(&attrs(&[("project_key", "OPS"), ("name", "Backend")]))
        .await
        .unwrap_err();

    match err {
        JiraformError::PartialFailure { remote_id, .. } => {
            assert_eq!(remote_id.as_deref(), Some("10050"))
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_import_membership_by_composite_id() {
    let mock = Arc::new(MockTransport::new());
    mock.on_get_query(
        "/rest/api/3/group/member",
        &[("groupname", "ops")],
        ok(json!({
            "startAt": 0, "maxResults": 50, "total": 1, "isLast": true,
            "values": [{"accountId": "u1"}]
        })),
    );

    let membership = reconciler(ResourceKind::GroupMembership, &mock);
    let applied = membership.import("ops/u1").await.unwrap();
    assert_eq!(applied.id, "ops/u1");
    assert_eq!(
        applied.observed,
        attrs(&[("group_name", "ops"), ("account_id", "u1")])
    );

    let err = membership.import("ops").await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);
}

#[tokio::test]
async fn test_membership_create_uses_composite_id() {
    let mock = Arc::new(MockTransport::new());
    mock.on_post("/rest/api/3/group/user", ok(json!({"name": "ops"})));
    mock.on_get(
        "/rest/api/3/group/member",
        ok(json!({
            "startAt": 0, "maxResults": 50, "total": 1, "isLast": true,
            "values": [{"accountId": "u1"}]
        })),
    );

    let applied = reconciler(ResourceKind::GroupMembership, &mock)
        .create(&attrs(&[("group_name", "ops"), ("account_id", "u1")]))
        .await
        .unwrap();
    assert_eq!(applied.id, "ops/u1");
}

#[tokio::test]
async fn test_scoped_member_blocks_scheme_create() {
    let mock = Arc::new(MockTransport::new());
    mock.on_get(
        "/rest/api/3/issuetype/10001",
        ok(json!({"id": "10001", "name": "Bug"})),
    );
    mock.on_get(
        "/rest/api/3/issuetype/10020",
        ok(json!({"id": "10020", "name": "Task", "scope": {"type": "PROJECT"}})),
    );

    let mut desired = attrs(&[("name", "Ops scheme")]);
    desired.insert(
        "issue_type_ids".to_string(),
        AttrValue::List(vec!["10001".into(), "10020".into()]),
    );

    let err = reconciler(ResourceKind::IssueTypeScheme, &mock)
        .create(&desired)
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);
    assert!(err.to_string().contains("10020"));
    assert_eq!(mock.count_method(Method::POST), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_create_retries() {
    let mock = Arc::new(MockTransport::new());
    mock.on(
        Method::POST,
        "/rest/api/3/issuetype",
        &[],
        vec![
            RawResponse::new(429, "").with_retry_after("2"),
            ok(json!({"id": "10030"})),
        ],
    );
    mock.on_get(
        "/rest/api/3/issuetype/10030",
        ok(json!({"id": "10030", "name": "Incident", "subtask": false})),
    );

    let applied = reconciler(ResourceKind::IssueType, &mock)
        .create(&attrs(&[("name", "Incident")]))
        .await
        .unwrap();
    assert_eq!(applied.id, "10030");
    assert_eq!(mock.count(Method::POST, "/rest/api/3/issuetype"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_budget_exhausted() {
    let mock = Arc::new(MockTransport::new());
    mock.on_post(
        "/rest/api/3/issuetype",
        RawResponse::new(429, "").with_retry_after("1"),
    );

    let client = JiraClient::new(mock.clone()).with_retry(RetryConfig {
        max_retries: 2,
        max_wait: Duration::from_secs(300),
    });
    let err = Reconciler::new(ResourceKind::IssueType, client)
        .create(&attrs(&[("name", "Incident")]))
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::RateLimited);
    assert_eq!(mock.count(Method::POST, "/rest/api/3/issuetype"), 3);
}
