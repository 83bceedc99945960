//! Automation rules
//!
//! Rules are created disabled and switched on by a separate state call.
//! Jira offers no delete for rules; removing one disables it. The rule
//! definition is write-only: reads report only the name and state.

use crate::error::{JiraformError, Result};
use crate::models::{AutomationRule, RuleState, RuleStateRequest};
use crate::reconciler::descriptor::{InstanceKey, ResourceKind};
use crate::reconciler::handler::{expect_id, Observed, ResourceHandler, UpdateStep};
use crate::reconciler::record::{decode_attributes, encode_attributes, Attributes};
use async_trait::async_trait;
use jira_rest::{encode_segment, ApiRequest, JiraClient};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const KIND: ResourceKind = ResourceKind::AutomationRule;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleAttrs {
    name: String,
    #[serde(default)]
    state: Option<String>,
    rule_json: String,
}

impl RuleAttrs {
    fn state(&self) -> Result<RuleState> {
        match self.state.as_deref() {
            None => Ok(RuleState::Enabled),
            Some(raw) => RuleState::parse(raw).ok_or_else(|| {
                JiraformError::invalid(
                    KIND.tag(),
                    format!("state must be ENABLED or DISABLED, got '{}'", raw),
                )
            }),
        }
    }

    /// The rule document with `name` set from the attribute
    fn definition(&self) -> Result<Value> {
        let mut rule: Value = serde_json::from_str(&self.rule_json).map_err(|e| {
            JiraformError::invalid(KIND.tag(), format!("rule_json is not valid JSON: {}", e))
        })?;
        match rule.as_object_mut() {
            Some(object) => {
                object.insert("name".to_string(), Value::String(self.name.clone()));
                Ok(rule)
            }
            None => Err(JiraformError::invalid(
                KIND.tag(),
                "rule_json must be a JSON object",
            )),
        }
    }
}

/// What a read can see of a rule
#[derive(Debug, Serialize)]
struct ObservedRule {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
}

pub struct AutomationRuleHandler {
    client: JiraClient,
}

impl AutomationRuleHandler {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    fn rule_path(id: &str) -> String {
        format!("/rest/v1/rule/{}", encode_segment(id))
    }

    fn state_request(id: &str, state: RuleState) -> Result<ApiRequest> {
        Ok(ApiRequest::put(format!("{}/state", Self::rule_path(id))).json(&RuleStateRequest { state })?)
    }
}

#[async_trait]
impl ResourceHandler for AutomationRuleHandler {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create_request(&self, desired: &Attributes) -> Result<ApiRequest> {
        let attrs: RuleAttrs = decode_attributes(KIND, desired)?;
        attrs.state()?;
        Ok(ApiRequest::post("/rest/v1/rule").body(attrs.definition()?))
    }

    fn activation_step(&self, id: &str, desired: &Attributes) -> Result<Option<UpdateStep>> {
        let attrs: RuleAttrs = decode_attributes(KIND, desired)?;
        match attrs.state()? {
            RuleState::Enabled => Ok(Some(UpdateStep::new(
                "rule state",
                Self::state_request(id, RuleState::Enabled)?,
            ))),
            RuleState::Disabled => Ok(None),
        }
    }

    async fn read(&self, key: &InstanceKey) -> Result<Option<Observed>> {
        let id = expect_id(KIND, key)?;
        let rule: AutomationRule = self.client.fetch(&ApiRequest::get(Self::rule_path(&id))).await?;

        let observed = ObservedRule {
            name: rule.name,
            state: rule
                .state
                .as_deref()
                .and_then(RuleState::parse)
                .map(|s| s.as_str().to_string()),
        };

        Ok(Some(Observed {
            id,
            attributes: encode_attributes(&observed)?,
        }))
    }

    async fn update_steps(
        &self,
        id: &str,
        desired: &Attributes,
        observed: &Attributes,
    ) -> Result<Vec<UpdateStep>> {
        let attrs: RuleAttrs = decode_attributes(KIND, desired)?;
        let state = attrs.state()?;

        // rule_json cannot be read back, so the definition is always resent
        let mut steps = vec![UpdateStep::new(
            "rule definition",
            ApiRequest::put(Self::rule_path(id)).body(attrs.definition()?),
        )];

        let current = observed
            .get("state")
            .and_then(|v| v.as_str())
            .and_then(RuleState::parse);
        if current != Some(state) {
            steps.push(UpdateStep::new("rule state", Self::state_request(id, state)?));
        }

        Ok(steps)
    }

    fn delete_request(&self, key: &InstanceKey) -> Result<ApiRequest> {
        self.disable_request(key)
    }

    fn disable_request(&self, key: &InstanceKey) -> Result<ApiRequest> {
        Self::state_request(&expect_id(KIND, key)?, RuleState::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::record::attrs;
    use jira_rest::mock::MockTransport;
    use jira_rest::{Method, RawResponse};
    use serde_json::json;
    use std::sync::Arc;

    fn handler() -> AutomationRuleHandler {
        AutomationRuleHandler::new(JiraClient::new(Arc::new(MockTransport::new())))
    }

    fn desired(state: Option<&str>) -> Attributes {
        let mut desired = attrs(&[
            ("name", "Close stale"),
            ("rule_json", r#"{"name":"ignored","trigger":{"component":"TRIGGER"}}"#),
        ]);
        if let Some(state) = state {
            desired.insert("state".to_string(), state.into());
        }
        desired
    }

    #[tokio::test]
    async fn test_create_injects_name() {
        let request = handler().create_request(&desired(None)).await.unwrap();
        assert_eq!(request.path, "/rest/v1/rule");
        assert_eq!(
            request.body,
            Some(json!({"name": "Close stale", "trigger": {"component": "TRIGGER"}}))
        );
    }

    #[tokio::test]
    async fn test_create_rejects_non_object_rule() {
        let mut bad = desired(None);
        bad.insert("rule_json".to_string(), "[1, 2]".into());
        let err = handler().create_request(&bad).await.unwrap_err();
        assert!(err.to_string().contains("rule_json must be a JSON object"));
    }

    #[test]
    fn test_activation_defaults_to_enabled() {
        let step = handler().activation_step("42", &desired(None)).unwrap().unwrap();
        assert_eq!(step.request.path, "/rest/v1/rule/42/state");
        assert_eq!(step.request.body, Some(json!({"state": "ENABLED"})));

        assert!(handler()
            .activation_step("42", &desired(Some("DISABLED")))
            .unwrap()
            .is_none());
        assert!(handler().activation_step("42", &desired(Some("paused"))).is_err());
    }

    #[tokio::test]
    async fn test_update_resends_definition() {
        let observed = attrs(&[("name", "Close stale"), ("state", "ENABLED")]);
        let steps = handler()
            .update_steps("42", &desired(Some("enabled")), &observed)
            .await
            .unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].name, "rule definition");
        assert_eq!(steps[0].request.method, Method::PUT);

        let steps = handler()
            .update_steps("42", &desired(Some("DISABLED")), &observed)
            .await
            .unwrap();
        assert_eq!(steps[1].name, "rule state");
    }

    #[test]
    fn test_delete_disables() {
        let request = handler()
            .delete_request(&InstanceKey::Id("42".to_string()))
            .unwrap();
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.body, Some(json!({"state": "DISABLED"})));
    }

    #[tokio::test]
    async fn test_read_keeps_addressed_id_without_id_field() {
        let mock = Arc::new(MockTransport::new());
        mock.on_get(
            "/rest/v1/rule/uuid-1",
            RawResponse::new(
                200,
                r#"{"ruleUuid":"uuid-1","name":"Close stale","state":"ENABLED"}"#,
            ),
        );
        let handler = AutomationRuleHandler::new(JiraClient::new(mock));
        let observed = handler
            .read(&InstanceKey::Id("uuid-1".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(observed.id, "uuid-1");
        assert_eq!(
            observed.attributes,
            attrs(&[("name", "Close stale"), ("state", "ENABLED")])
        );
    }

    #[tokio::test]
    async fn test_read_omits_rule_json() {
        let mock = Arc::new(MockTransport::new());
        mock.on_get(
            "/rest/v1/rule/42",
            RawResponse::new(200, r#"{"id":42,"name":"Close stale","state":"DISABLED","trigger":{}}"#),
        );
        let handler = AutomationRuleHandler::new(JiraClient::new(mock));
        let observed = handler
            .read(&InstanceKey::Id("42".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(observed.id, "42");
        assert_eq!(
            observed.attributes,
            attrs(&[("name", "Close stale"), ("state", "DISABLED")])
        );
    }
}
