//! Action translation: variant trigger and invocation-method blocks to the
//! polymorphic wire documents and back.

use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::models::action::{
    Action, ActionState, ApprovalWebhookNotificationState, AutomationTriggerState,
    AzureMethodState, GithubMethodState, GitlabMethodState, KafkaMethodState,
    SelfServiceTriggerState, UpsertEntityMethodState, WebhookMethodState,
};
use crate::types::Field;

use super::{computed_field, parse_json_string, refresh_field, to_json_string};

/// Build the wire action from declarative state. Exactly one trigger block
/// and exactly one invocation-method block must be set.
pub fn action_to_body(state: &ActionState) -> Result<Action, ProviderError> {
    if state.trigger_count() != 1 {
        return Err(ProviderError::Validation(
            "exactly one of self_service_trigger and automation_trigger must be set".to_string(),
        ));
    }
    if state.method_count() != 1 {
        return Err(ProviderError::Validation(
            "exactly one invocation method must be set".to_string(),
        ));
    }

    let trigger = if let Some(t) = &state.self_service_trigger {
        self_service_trigger_value(t)?
    } else {
        // trigger_count() == 1 guarantees the automation block is present
        automation_trigger_value(state.automation_trigger.as_ref().ok_or_else(|| {
            ProviderError::Validation("automation trigger missing".to_string())
        })?)?
    };

    let invocation_method = invocation_method_value(state)?;

    let required_approval = state
        .required_approval
        .to_body()
        .map(|v| json!({"type": v.clone()}));

    let approval_notification = if let Some(webhook) = &state.approval_webhook_notification {
        let mut out = serde_json::Map::new();
        out.insert("type".to_string(), Value::String("WEBHOOK".to_string()));
        out.insert("url".to_string(), Value::String(webhook.url.clone()));
        if let Some(format) = webhook.format.to_body() {
            out.insert("format".to_string(), Value::String(format.clone()));
        }
        Some(Value::Object(out))
    } else if state.approval_email_notification.as_known() == Some(&true) {
        Some(json!({"type": "email"}))
    } else {
        None
    };

    Ok(Action {
        identifier: state.identifier.clone(),
        title: state.title.to_body().cloned(),
        icon: state.icon.to_body().cloned(),
        description: state.description.to_body().cloned(),
        publish: state.publish.to_body().copied(),
        trigger: Some(trigger),
        invocation_method: Some(invocation_method),
        required_approval,
        approval_notification,
        created_at: None,
        created_by: None,
        updated_at: None,
        updated_by: None,
    })
}

/// Fold a freshly read action document back into declarative state.
pub fn refresh_action_state(
    state: &mut ActionState,
    wire: &Action,
    escape_html: bool,
) -> Result<(), ProviderError> {
    state.identifier = wire.identifier.clone();
    refresh_field(&mut state.title, wire.title.as_ref());
    refresh_field(&mut state.icon, wire.icon.as_ref());
    refresh_field(&mut state.description, wire.description.as_ref());
    refresh_field(&mut state.publish, wire.publish.as_ref());

    if let Some(trigger) = &wire.trigger {
        refresh_trigger(state, trigger, escape_html)?;
    }
    if let Some(method) = &wire.invocation_method {
        refresh_invocation_method(state, method, escape_html)?;
    }

    let approval_type = wire
        .required_approval
        .as_ref()
        .and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        });
    refresh_field(&mut state.required_approval, approval_type.as_ref());

    computed_field(&mut state.created_at, wire.created_at.as_ref());
    computed_field(&mut state.created_by, wire.created_by.as_ref());
    computed_field(&mut state.updated_at, wire.updated_at.as_ref());
    computed_field(&mut state.updated_by, wire.updated_by.as_ref());
    Ok(())
}

// -------------------------------------------------------------------------
// Declarative to wire
// -------------------------------------------------------------------------

fn self_service_trigger_value(t: &SelfServiceTriggerState) -> Result<Value, ProviderError> {
    let mut out = serde_json::Map::new();
    out.insert("type".to_string(), Value::String("self-service".to_string()));
    out.insert("operation".to_string(), Value::String(t.operation.clone()));
    if let Some(bp) = t.blueprint_identifier.to_body() {
        out.insert("blueprintIdentifier".to_string(), Value::String(bp.clone()));
    }

    let mut user_inputs = serde_json::Map::new();
    if let Some(raw) = t.user_properties.to_body() {
        user_inputs.insert(
            "properties".to_string(),
            parse_json_string(raw, "user_properties")?,
        );
    }
    if let Some(raw) = t.required_jq_query.to_body() {
        user_inputs.insert("required".to_string(), json!({ "jqQuery": raw.clone() }));
    }
    if let Some(order) = t.order_properties.to_body() {
        user_inputs.insert(
            "order".to_string(),
            Value::Array(order.iter().cloned().map(Value::String).collect()),
        );
    }
    if !user_inputs.is_empty() {
        out.insert("userInputs".to_string(), Value::Object(user_inputs));
    }
    if let Some(raw) = t.condition.to_body() {
        out.insert("condition".to_string(), parse_json_string(raw, "condition")?);
    }
    Ok(Value::Object(out))
}

fn automation_trigger_value(t: &AutomationTriggerState) -> Result<Value, ProviderError> {
    let mut event = serde_json::Map::new();
    event.insert("type".to_string(), Value::String(t.event.clone()));
    if let Some(bp) = t.blueprint_identifier.to_body() {
        event.insert("blueprintIdentifier".to_string(), Value::String(bp.clone()));
    }
    if let Some(action) = t.action_identifier.to_body() {
        event.insert("actionIdentifier".to_string(), Value::String(action.clone()));
    }

    let mut out = serde_json::Map::new();
    out.insert("type".to_string(), Value::String("automation".to_string()));
    out.insert("event".to_string(), Value::Object(event));
    if let Some(expressions) = t.jq_condition_expressions.to_body() {
        let mut condition = serde_json::Map::new();
        condition.insert("type".to_string(), Value::String("JQ".to_string()));
        condition.insert(
            "expressions".to_string(),
            Value::Array(expressions.iter().cloned().map(Value::String).collect()),
        );
        if let Some(combinator) = t.jq_condition_combinator.to_body() {
            condition.insert("combinator".to_string(), Value::String(combinator.clone()));
        }
        out.insert("condition".to_string(), Value::Object(condition));
    }
    Ok(Value::Object(out))
}

fn invocation_method_value(state: &ActionState) -> Result<Value, ProviderError> {
    if let Some(m) = &state.webhook_method {
        return webhook_method_value(m);
    }
    if let Some(m) = &state.kafka_method {
        return kafka_method_value(m);
    }
    if let Some(m) = &state.github_method {
        return github_method_value(m);
    }
    if let Some(m) = &state.gitlab_method {
        return gitlab_method_value(m);
    }
    if let Some(m) = &state.azure_method {
        return azure_method_value(m);
    }
    if let Some(m) = &state.upsert_entity_method {
        return upsert_entity_method_value(m);
    }
    Err(ProviderError::Validation(
        "no invocation method set".to_string(),
    ))
}

fn webhook_method_value(m: &WebhookMethodState) -> Result<Value, ProviderError> {
    let mut out = serde_json::Map::new();
    out.insert("type".to_string(), Value::String("WEBHOOK".to_string()));
    out.insert("url".to_string(), Value::String(m.url.clone()));
    if let Some(agent) = m.agent.to_body() {
        out.insert("agent".to_string(), Value::Bool(*agent));
    }
    if let Some(synchronized) = m.synchronized.to_body() {
        out.insert("synchronized".to_string(), Value::Bool(*synchronized));
    }
    if let Some(method) = m.method.to_body() {
        out.insert("method".to_string(), Value::String(method.clone()));
    }
    if let Some(raw) = m.headers.to_body() {
        out.insert("headers".to_string(), parse_json_string(raw, "webhook headers")?);
    }
    if let Some(raw) = m.body.to_body() {
        out.insert("body".to_string(), parse_json_string(raw, "webhook body")?);
    }
    Ok(Value::Object(out))
}

fn kafka_method_value(m: &KafkaMethodState) -> Result<Value, ProviderError> {
    let mut out = serde_json::Map::new();
    out.insert("type".to_string(), Value::String("KAFKA".to_string()));
    if let Some(raw) = m.payload.to_body() {
        out.insert("payload".to_string(), parse_json_string(raw, "kafka payload")?);
    }
    Ok(Value::Object(out))
}

fn github_method_value(m: &GithubMethodState) -> Result<Value, ProviderError> {
    let mut out = serde_json::Map::new();
    out.insert("type".to_string(), Value::String("GITHUB".to_string()));
    out.insert("org".to_string(), Value::String(m.org.clone()));
    out.insert("repo".to_string(), Value::String(m.repo.clone()));
    out.insert("workflow".to_string(), Value::String(m.workflow.clone()));
    if let Some(raw) = m.workflow_inputs.to_body() {
        out.insert(
            "workflowInputs".to_string(),
            parse_json_string(raw, "workflow inputs")?,
        );
    }
    if let Some(report) = m.report_workflow_status.to_body() {
        out.insert("reportWorkflowStatus".to_string(), Value::Bool(*report));
    }
    Ok(Value::Object(out))
}

fn gitlab_method_value(m: &GitlabMethodState) -> Result<Value, ProviderError> {
    let mut out = serde_json::Map::new();
    out.insert("type".to_string(), Value::String("GITLAB".to_string()));
    out.insert("projectName".to_string(), Value::String(m.project_name.clone()));
    out.insert("groupName".to_string(), Value::String(m.group_name.clone()));
    if let Some(default_ref) = m.default_ref.to_body() {
        out.insert("defaultRef".to_string(), Value::String(default_ref.clone()));
    }
    if let Some(raw) = m.pipeline_variables.to_body() {
        out.insert(
            "pipelineVariables".to_string(),
            parse_json_string(raw, "pipeline variables")?,
        );
    }
    Ok(Value::Object(out))
}

fn azure_method_value(m: &AzureMethodState) -> Result<Value, ProviderError> {
    let mut out = serde_json::Map::new();
    out.insert("type".to_string(), Value::String("AZURE_DEVOPS".to_string()));
    out.insert("org".to_string(), Value::String(m.org.clone()));
    out.insert("webhook".to_string(), Value::String(m.webhook.clone()));
    if let Some(raw) = m.payload.to_body() {
        out.insert("payload".to_string(), parse_json_string(raw, "azure payload")?);
    }
    Ok(Value::Object(out))
}

fn upsert_entity_method_value(m: &UpsertEntityMethodState) -> Result<Value, ProviderError> {
    let mut mapping = serde_json::Map::new();
    if let Some(identifier) = m.identifier.to_body() {
        mapping.insert("identifier".to_string(), Value::String(identifier.clone()));
    }
    if let Some(title) = m.title.to_body() {
        mapping.insert("title".to_string(), Value::String(title.clone()));
    }
    if let Some(teams) = m.teams.to_body() {
        mapping.insert(
            "team".to_string(),
            Value::Array(teams.iter().cloned().map(Value::String).collect()),
        );
    }
    if let Some(raw) = m.mapping.to_body() {
        let parsed = parse_json_string(raw, "upsert entity mapping")?;
        if let Value::Object(extra) = parsed {
            for (k, v) in extra {
                mapping.insert(k, v);
            }
        }
    }

    let mut out = serde_json::Map::new();
    out.insert("type".to_string(), Value::String("UPSERT_ENTITY".to_string()));
    out.insert(
        "blueprintIdentifier".to_string(),
        Value::String(m.blueprint_identifier.clone()),
    );
    out.insert("mapping".to_string(), Value::Object(mapping));
    Ok(Value::Object(out))
}

// -------------------------------------------------------------------------
// Wire back to declarative
// -------------------------------------------------------------------------

fn refresh_trigger(
    state: &mut ActionState,
    trigger: &Value,
    escape_html: bool,
) -> Result<(), ProviderError> {
    match trigger.get("type").and_then(Value::as_str) {
        Some("self-service") => {
            let t = state
                .self_service_trigger
                .get_or_insert_with(Default::default);
            if let Some(op) = trigger.get("operation").and_then(Value::as_str) {
                t.operation = op.to_string();
            }
            let bp = trigger
                .get("blueprintIdentifier")
                .and_then(Value::as_str)
                .map(str::to_string);
            refresh_field(&mut t.blueprint_identifier, bp.as_ref());

            let user_inputs = trigger.get("userInputs");
            let properties = match user_inputs.and_then(|u| u.get("properties")) {
                Some(v) => Some(to_json_string(v, escape_html)?),
                None => None,
            };
            refresh_field(&mut t.user_properties, properties.as_ref());
            let required = user_inputs
                .and_then(|u| u.get("required"))
                .and_then(|r| r.get("jqQuery"))
                .and_then(Value::as_str)
                .map(str::to_string);
            refresh_field(&mut t.required_jq_query, required.as_ref());
            let order = user_inputs
                .and_then(|u| u.get("order"))
                .and_then(Value::as_array)
                .map(|vs| {
                    vs.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                });
            refresh_field(&mut t.order_properties, order.as_ref());
            let condition = match trigger.get("condition") {
                Some(v) => Some(to_json_string(v, escape_html)?),
                None => None,
            };
            refresh_field(&mut t.condition, condition.as_ref());
            state.automation_trigger = None;
        },
        Some("automation") => {
            let t = state.automation_trigger.get_or_insert_with(Default::default);
            let event = trigger.get("event");
            if let Some(kind) = event.and_then(|e| e.get("type")).and_then(Value::as_str) {
                t.event = kind.to_string();
            }
            let bp = event
                .and_then(|e| e.get("blueprintIdentifier"))
                .and_then(Value::as_str)
                .map(str::to_string);
            refresh_field(&mut t.blueprint_identifier, bp.as_ref());
            let action = event
                .and_then(|e| e.get("actionIdentifier"))
                .and_then(Value::as_str)
                .map(str::to_string);
            refresh_field(&mut t.action_identifier, action.as_ref());
            let condition = trigger.get("condition");
            let expressions = condition
                .and_then(|c| c.get("expressions"))
                .and_then(Value::as_array)
                .map(|vs| {
                    vs.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                });
            refresh_field(&mut t.jq_condition_expressions, expressions.as_ref());
            let combinator = condition
                .and_then(|c| c.get("combinator"))
                .and_then(Value::as_str)
                .map(str::to_string);
            refresh_field(&mut t.jq_condition_combinator, combinator.as_ref());
            state.self_service_trigger = None;
        },
        _ => {},
    }
    Ok(())
}

fn refresh_invocation_method(
    state: &mut ActionState,
    method: &Value,
    escape_html: bool,
) -> Result<(), ProviderError> {
    match method.get("type").and_then(Value::as_str) {
        Some("WEBHOOK") => {
            let m = state.webhook_method.get_or_insert_with(Default::default);
            if let Some(url) = method.get("url").and_then(Value::as_str) {
                m.url = url.to_string();
            }
            let agent = method.get("agent").and_then(Value::as_bool);
            refresh_field(&mut m.agent, agent.as_ref());
            let synchronized = method.get("synchronized").and_then(Value::as_bool);
            refresh_field(&mut m.synchronized, synchronized.as_ref());
            let http_method = method
                .get("method")
                .and_then(Value::as_str)
                .map(str::to_string);
            refresh_field(&mut m.method, http_method.as_ref());
            let headers = match method.get("headers") {
                Some(v) => Some(to_json_string(v, escape_html)?),
                None => None,
            };
            refresh_field(&mut m.headers, headers.as_ref());
            let body = match method.get("body") {
                Some(v) => Some(to_json_string(v, escape_html)?),
                None => None,
            };
            refresh_field(&mut m.body, body.as_ref());
        },
        Some("KAFKA") => {
            let m = state.kafka_method.get_or_insert_with(Default::default);
            let payload = match method.get("payload") {
                Some(v) => Some(to_json_string(v, escape_html)?),
                None => None,
            };
            refresh_field(&mut m.payload, payload.as_ref());
        },
        Some("GITHUB") => {
            let m = state.github_method.get_or_insert_with(Default::default);
            if let Some(org) = method.get("org").and_then(Value::as_str) {
                m.org = org.to_string();
            }
            if let Some(repo) = method.get("repo").and_then(Value::as_str) {
                m.repo = repo.to_string();
            }
            if let Some(workflow) = method.get("workflow").and_then(Value::as_str) {
                m.workflow = workflow.to_string();
            }
            let inputs = match method.get("workflowInputs") {
                Some(v) => Some(to_json_string(v, escape_html)?),
                None => None,
            };
            refresh_field(&mut m.workflow_inputs, inputs.as_ref());
            let report = method.get("reportWorkflowStatus").and_then(Value::as_bool);
            refresh_field(&mut m.report_workflow_status, report.as_ref());
        },
        Some("GITLAB") => {
            let m = state.gitlab_method.get_or_insert_with(Default::default);
            if let Some(project) = method.get("projectName").and_then(Value::as_str) {
                m.project_name = project.to_string();
            }
            if let Some(group) = method.get("groupName").and_then(Value::as_str) {
                m.group_name = group.to_string();
            }
            let default_ref = method
                .get("defaultRef")
                .and_then(Value::as_str)
                .map(str::to_string);
            refresh_field(&mut m.default_ref, default_ref.as_ref());
            let variables = match method.get("pipelineVariables") {
                Some(v) => Some(to_json_string(v, escape_html)?),
                None => None,
            };
            refresh_field(&mut m.pipeline_variables, variables.as_ref());
        },
        Some("AZURE_DEVOPS") => {
            let m = state.azure_method.get_or_insert_with(Default::default);
            if let Some(org) = method.get("org").and_then(Value::as_str) {
                m.org = org.to_string();
            }
            if let Some(webhook) = method.get("webhook").and_then(Value::as_str) {
                m.webhook = webhook.to_string();
            }
            let payload = match method.get("payload") {
                Some(v) => Some(to_json_string(v, escape_html)?),
                None => None,
            };
            refresh_field(&mut m.payload, payload.as_ref());
        },
        Some("UPSERT_ENTITY") => {
            let m = state
                .upsert_entity_method
                .get_or_insert_with(Default::default);
            if let Some(bp) = method.get("blueprintIdentifier").and_then(Value::as_str) {
                m.blueprint_identifier = bp.to_string();
            }
            let mapping = method.get("mapping");
            let identifier = mapping
                .and_then(|v| v.get("identifier"))
                .and_then(Value::as_str)
                .map(str::to_string);
            refresh_field(&mut m.identifier, identifier.as_ref());
            let title = mapping
                .and_then(|v| v.get("title"))
                .and_then(Value::as_str)
                .map(str::to_string);
            refresh_field(&mut m.title, title.as_ref());
            let teams = mapping
                .and_then(|v| v.get("team"))
                .and_then(Value::as_array)
                .map(|vs| {
                    vs.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                });
            refresh_field(&mut m.teams, teams.as_ref());
            if m.mapping.is_known() {
                let rest = mapping.map(|v| {
                    let mut cloned = v.clone();
                    if let Value::Object(map) = &mut cloned {
                        map.remove("identifier");
                        map.remove("title");
                        map.remove("team");
                    }
                    cloned
                });
                let rendered = match rest {
                    Some(v) => Some(to_json_string(&v, escape_html)?),
                    None => None,
                };
                refresh_field(&mut m.mapping, rendered.as_ref());
            }
        },
        _ => {},
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn webhook_action() -> ActionState {
        ActionState {
            identifier: "restart".to_string(),
            title: Field::Known("Restart".to_string()),
            self_service_trigger: Some(SelfServiceTriggerState {
                operation: "DAY-2".to_string(),
                blueprint_identifier: Field::Known("svc".to_string()),
                ..Default::default()
            }),
            webhook_method: Some(WebhookMethodState {
                url: "https://hooks.example.com".to_string(),
                synchronized: Field::Known(true),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_to_body_assembles_trigger_and_method() {
        let wire = action_to_body(&webhook_action()).unwrap();
        let trigger = wire.trigger.unwrap();
        assert_eq!(trigger["type"], "self-service");
        assert_eq!(trigger["operation"], "DAY-2");
        assert_eq!(trigger["blueprintIdentifier"], "svc");

        let method = wire.invocation_method.unwrap();
        assert_eq!(method["type"], "WEBHOOK");
        assert_eq!(method["url"], "https://hooks.example.com");
        assert_eq!(method["synchronized"], true);
    }

    #[test]
    fn test_missing_trigger_rejected() {
        let state = ActionState {
            identifier: "restart".to_string(),
            webhook_method: Some(WebhookMethodState {
                url: "https://hooks.example.com".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = action_to_body(&state).unwrap_err();
        assert!(err.to_string().contains("trigger"));
    }

    #[test]
    fn test_two_methods_rejected() {
        let mut state = webhook_action();
        state.kafka_method = Some(KafkaMethodState::default());
        let err = action_to_body(&state).unwrap_err();
        assert!(err.to_string().contains("invocation method"));
    }

    #[test]
    fn test_round_trip_preserves_user_fields() {
        let state = webhook_action();
        let wire = action_to_body(&state).unwrap();

        let mut refreshed = webhook_action();
        refresh_action_state(&mut refreshed, &wire, true).unwrap();

        assert_eq!(refreshed.title, Field::Known("Restart".to_string()));
        let trigger = refreshed.self_service_trigger.unwrap();
        assert_eq!(trigger.operation, "DAY-2");
        let method = refreshed.webhook_method.unwrap();
        assert_eq!(method.url, "https://hooks.example.com");
        assert_eq!(method.synchronized, Field::Known(true));
    }

    #[test]
    fn test_automation_trigger_round_trip() {
        let mut state = ActionState {
            identifier: "notify".to_string(),
            automation_trigger: Some(AutomationTriggerState {
                event: "ENTITY_CREATED".to_string(),
                blueprint_identifier: Field::Known("svc".to_string()),
                jq_condition_expressions: Field::Known(vec![
                    ".diff.after.properties.tier == \"gold\"".to_string(),
                ]),
                jq_condition_combinator: Field::Known("and".to_string()),
                ..Default::default()
            }),
            kafka_method: Some(KafkaMethodState::default()),
            ..Default::default()
        };
        let wire = action_to_body(&state).unwrap();
        let trigger = wire.trigger.clone().unwrap();
        assert_eq!(trigger["type"], "automation");
        assert_eq!(trigger["event"]["type"], "ENTITY_CREATED");
        assert_eq!(trigger["condition"]["type"], "JQ");

        refresh_action_state(&mut state, &wire, true).unwrap();
        let t = state.automation_trigger.unwrap();
        assert_eq!(t.event, "ENTITY_CREATED");
        assert_eq!(t.jq_condition_combinator, Field::Known("and".to_string()));
    }

    #[test]
    fn test_required_approval_object_and_string_forms() {
        let mut state = webhook_action();
        state.required_approval = Field::Known("ANY".to_string());
        let wire = action_to_body(&state).unwrap();
        assert_eq!(wire.required_approval, Some(json!({"type": "ANY"})));

        // Older documents carry a plain string
        let legacy = Action {
            identifier: "restart".to_string(),
            required_approval: Some(json!("ALL")),
            ..Default::default()
        };
        refresh_action_state(&mut state, &legacy, true).unwrap();
        assert_eq!(state.required_approval, Field::Known("ALL".to_string()));
    }
}
