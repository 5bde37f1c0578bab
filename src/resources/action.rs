//! The `port_action` resource.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::PortClient;
use crate::error::ProviderError;
use crate::models::action::ActionState;
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::translate::action::{action_to_body, refresh_action_state};

use super::{decode_state, encode_state, Resource};

/// Self-service and automation actions.
#[derive(Debug, Default)]
pub struct ActionResource;

#[async_trait]
impl Resource for ActionResource {
    fn type_name(&self) -> &'static str {
        "port_action"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("identifier", Attribute::required_string())
            .with_attribute("title", Attribute::optional_string())
            .with_attribute("icon", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("publish", Attribute::optional_bool())
            .with_attribute(
                "required_approval",
                Attribute::optional_string().with_enum_values(["ANY", "ALL"]),
            )
            .with_block(
                "self_service_trigger",
                NestedBlock::single(
                    Block::new()
                        .with_attribute(
                            "operation",
                            Attribute::optional_string().with_enum_values([
                                "CREATE", "DAY-2", "DELETE",
                            ]),
                        )
                        .with_attribute("blueprint_identifier", Attribute::optional_string())
                        .with_attribute(
                            "user_properties",
                            Attribute::optional_string().with_semantic_json(),
                        )
                        .with_attribute("required_jq_query", Attribute::optional_string())
                        .with_attribute("order_properties", Attribute::optional_string_list())
                        .with_attribute(
                            "condition",
                            Attribute::optional_string().with_semantic_json(),
                        ),
                ),
            )
            .with_block(
                "automation_trigger",
                NestedBlock::single(Block::new()),
            )
            .with_block("webhook_method", NestedBlock::single(Block::new()))
            .with_block("kafka_method", NestedBlock::single(Block::new()))
            .with_block("github_method", NestedBlock::single(Block::new()))
            .with_block("gitlab_method", NestedBlock::single(Block::new()))
            .with_block("azure_method", NestedBlock::single(Block::new()))
            .with_block("upsert_entity_method", NestedBlock::single(Block::new()))
    }

    fn validate(&self, config: &Value) -> Vec<crate::schema::Diagnostic> {
        let mut diagnostics = crate::validation::validate(&self.schema(), config);
        let triggers = ["self_service_trigger", "automation_trigger"];
        let set: Vec<&str> = triggers
            .iter()
            .filter(|name| matches!(config.get(**name), Some(v) if !v.is_null()))
            .copied()
            .collect();
        if set.len() != 1 {
            diagnostics.push(
                crate::schema::Diagnostic::error("Exactly one trigger must be set")
                    .with_detail("Set either self_service_trigger or automation_trigger"),
            );
        }
        diagnostics
    }

    async fn read(
        &self,
        client: &PortClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let mut state: ActionState = decode_state(state)?;
        let (wire, _status) = client.get_action(&state.identifier).await?;
        let Some(wire) = wire else {
            return Ok(None);
        };
        refresh_action_state(&mut state, &wire, client.json_escape_html())?;
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        let mut state: ActionState = decode_state(planned)?;
        let body = action_to_body(&state)?;
        let (wire, _status) = client.create_action(&body).await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client.get_action(&state.identifier).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "action {} missing after create",
                        state.identifier
                    ))
                })?
            },
        };
        refresh_action_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: ActionState = decode_state(planned)?;
        let body = action_to_body(&state)?;
        let (wire, _status) = client.update_action(&state.identifier, &body).await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client.get_action(&state.identifier).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "action {} missing after update",
                        state.identifier
                    ))
                })?
            },
        };
        refresh_action_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError> {
        let state: ActionState = decode_state(state)?;
        client.delete_action(&state.identifier).await?;
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::InvalidImportId(
                "expected an action identifier".to_string(),
            ));
        }
        Ok(json!({ "identifier": id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::rate_limit::RateLimitGovernor;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client(server: &MockServer) -> PortClient {
        PortClient::builder(server.base_url())
            .governor(RateLimitGovernor::new(false, false))
            .token("t")
            .build()
            .unwrap()
    }

    #[test]
    fn test_validate_requires_exactly_one_trigger() {
        let resource = ActionResource;
        let ok = resource.validate(&json!({
            "identifier": "restart",
            "self_service_trigger": {"operation": "DAY-2"}
        }));
        assert!(ok.is_empty(), "{ok:?}");

        let none = resource.validate(&json!({"identifier": "restart"}));
        assert_eq!(none.len(), 1);

        let both = resource.validate(&json!({
            "identifier": "restart",
            "self_service_trigger": {"operation": "DAY-2"},
            "automation_trigger": {}
        }));
        assert!(!both.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_through_api() {
        let server = MockServer::start_async().await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/actions");
                then.status(201).json_body(json!({
                    "ok": true,
                    "action": {
                        "identifier": "restart",
                        "title": "Restart",
                        "trigger": {
                            "type": "self-service",
                            "operation": "DAY-2",
                            "blueprintIdentifier": "svc"
                        },
                        "invocationMethod": {"type": "WEBHOOK", "url": "https://hook.example.com"}
                    }
                }));
            })
            .await;

        let state = ActionResource
            .create(
                &test_client(&server),
                json!({
                    "identifier": "restart",
                    "title": "Restart",
                    "self_service_trigger": {
                        "operation": "DAY-2",
                        "blueprint_identifier": "svc"
                    },
                    "webhook_method": {"url": "https://hook.example.com"}
                }),
            )
            .await
            .unwrap();

        post.assert_async().await;
        assert_eq!(state["identifier"], "restart");
        assert_eq!(state["webhook_method"]["url"], "https://hook.example.com");
    }
}
