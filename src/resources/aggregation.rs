//! The `port_aggregation_property` resource.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::client::PortClient;
use crate::error::ProviderError;
use crate::models::aggregation::AggregationPropertyState;
use crate::models::blueprint::Blueprint;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema};
use crate::translate::aggregation::{
    aggregation_property_to_body, refresh_aggregation_property_state,
};
use crate::validation;

use super::{composite_id, decode_state, encode_state, write_blueprint, Resource};

/// A single aggregation property managed standalone, by read-modify-write of
/// its parent blueprint document.
#[derive(Debug, Default)]
pub struct AggregationPropertyResource;

#[async_trait]
impl Resource for AggregationPropertyResource {
    fn type_name(&self) -> &'static str {
        "port_aggregation_property"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "blueprint_identifier",
                Attribute::required_string().with_requires_replace(),
            )
            .with_attribute(
                "aggregation_identifier",
                Attribute::required_string().with_requires_replace(),
            )
            .with_attribute("target_blueprint_identifier", Attribute::required_string())
            .with_attribute("title", Attribute::optional_string())
            .with_attribute("icon", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("query", Attribute::optional_string().with_semantic_json())
            .with_block(
                "method",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("count_entities", Attribute::optional_bool())
                        .with_block(
                            "average_entities",
                            NestedBlock::single(
                                Block::new()
                                    .with_attribute("average_of", Attribute::optional_string())
                                    .with_attribute(
                                        "measure_time_by",
                                        Attribute::optional_string(),
                                    ),
                            ),
                        )
                        .with_block(
                            "average_by_property",
                            NestedBlock::single(
                                Block::new()
                                    .with_attribute("average_of", Attribute::required_string())
                                    .with_attribute(
                                        "measure_time_by",
                                        Attribute::required_string(),
                                    )
                                    .with_attribute("property", Attribute::required_string()),
                            ),
                        )
                        .with_block(
                            "aggregate_by_property",
                            NestedBlock::single(
                                Block::new()
                                    .with_attribute(
                                        "func",
                                        Attribute::required_string().with_enum_values([
                                            "sum", "min", "max", "median",
                                        ]),
                                    )
                                    .with_attribute("property", Attribute::required_string()),
                            ),
                        )
                        .with_mutually_exclusive([
                            "count_entities",
                            "average_entities",
                            "average_by_property",
                            "aggregate_by_property",
                        ]),
                )
                .with_min_items(1),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);
        if let Ok(state) = serde_json::from_value::<AggregationPropertyState>(config.clone()) {
            if state.method.variant_count() != 1 {
                diagnostics.push(
                    Diagnostic::error("exactly one aggregation method must be set")
                        .with_attribute("method"),
                );
            }
        }
        diagnostics
    }

    async fn read(
        &self,
        client: &PortClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let mut state: AggregationPropertyState = decode_state(state)?;
        let (blueprint, _status) = client.get_blueprint(&state.blueprint_identifier).await?;
        let Some(blueprint) = blueprint else {
            debug!(
                blueprint = %state.blueprint_identifier,
                "parent blueprint gone, dropping aggregation property from state"
            );
            return Ok(None);
        };
        let Some(body) = blueprint
            .aggregation_properties
            .as_ref()
            .and_then(|map| map.get(&state.aggregation_identifier))
        else {
            return Ok(None);
        };
        refresh_aggregation_property_state(&mut state, body, client.json_escape_html())?;
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        let mut state: AggregationPropertyState = decode_state(planned)?;
        let mut blueprint = require_blueprint(client, &state.blueprint_identifier).await?;
        let map = blueprint.aggregation_properties.get_or_insert_with(Default::default);
        if map.contains_key(&state.aggregation_identifier) {
            return Err(ProviderError::AlreadyExists(format!(
                "aggregation property {} already exists on blueprint {}",
                state.aggregation_identifier, state.blueprint_identifier
            )));
        }
        map.insert(
            state.aggregation_identifier.clone(),
            aggregation_property_to_body(&state)?,
        );
        self.write_and_refresh(client, &blueprint, &mut state).await?;
        Ok(encode_state(&state)?)
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: AggregationPropertyState = decode_state(planned)?;
        let mut blueprint = require_blueprint(client, &state.blueprint_identifier).await?;
        blueprint
            .aggregation_properties
            .get_or_insert_with(Default::default)
            .insert(
                state.aggregation_identifier.clone(),
                aggregation_property_to_body(&state)?,
            );
        self.write_and_refresh(client, &blueprint, &mut state).await?;
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError> {
        let state: AggregationPropertyState = decode_state(state)?;
        let (blueprint, _status) = client.get_blueprint(&state.blueprint_identifier).await?;
        let Some(mut blueprint) = blueprint else {
            return Ok(());
        };
        let removed = blueprint
            .aggregation_properties
            .as_mut()
            .and_then(|map| map.remove(&state.aggregation_identifier));
        if removed.is_none() {
            return Ok(());
        }
        let written = write_blueprint(client, &blueprint).await?;
        let still_present = written
            .aggregation_properties
            .as_ref()
            .is_some_and(|map| map.contains_key(&state.aggregation_identifier));
        if still_present {
            return Err(ProviderError::PostCondition(format!(
                "aggregation property {} still present on blueprint {} after delete",
                state.aggregation_identifier, state.blueprint_identifier
            )));
        }
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let (blueprint, aggregation) = composite_id(id, "blueprint_id:aggregation_id")?;
        Ok(json!({
            "blueprint_identifier": blueprint,
            "aggregation_identifier": aggregation,
            "target_blueprint_identifier": ""
        }))
    }
}

impl AggregationPropertyResource {
    async fn write_and_refresh(
        &self,
        client: &PortClient,
        blueprint: &Blueprint,
        state: &mut AggregationPropertyState,
    ) -> Result<(), ProviderError> {
        let written = write_blueprint(client, blueprint).await?;
        let body = written
            .aggregation_properties
            .as_ref()
            .and_then(|map| map.get(&state.aggregation_identifier))
            .ok_or_else(|| {
                ProviderError::PostCondition(format!(
                    "aggregation property {} missing from blueprint {} after write",
                    state.aggregation_identifier, state.blueprint_identifier
                ))
            })?;
        refresh_aggregation_property_state(state, body, client.json_escape_html())
    }
}

pub(super) async fn require_blueprint(
    client: &PortClient,
    identifier: &str,
) -> Result<Blueprint, ProviderError> {
    let (blueprint, _status) = client.get_blueprint(identifier).await?;
    blueprint.ok_or_else(|| {
        ProviderError::NotFound(format!("blueprint {identifier} does not exist"))
    })
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

    fn planned() -> Value {
        json!({
            "blueprint_identifier": "svc",
            "aggregation_identifier": "podCount",
            "target_blueprint_identifier": "pod",
            "method": {"count_entities": true}
        })
    }

    #[tokio::test]
    async fn test_create_verifies_against_follow_up_read() {
        let server = MockServer::start_async().await;
        let get = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc");
                then.status(200).json_body(json!({
                    "ok": true,
                    "blueprint": {"identifier": "svc", "schema": {"properties": {}}}
                }));
            })
            .await;
        // The PUT echoes the inserted property back, but the follow-up read
        // shows the server never persisted it
        let put = server
            .mock_async(|when, then| {
                when.method(PUT).path("/v1/blueprints/svc").json_body_includes(
                    r#"{"aggregationProperties": {"podCount": {
                        "target": "pod",
                        "calculationSpec": {"calculationBy": "entities", "func": "count"}
                    }}}"#,
                );
                then.status(200).json_body(json!({
                    "ok": true,
                    "blueprint": {
                        "identifier": "svc",
                        "aggregationProperties": {"podCount": {
                            "target": "pod",
                            "calculationSpec": {"calculationBy": "entities", "func": "count"}
                        }}
                    }
                }));
            })
            .await;

        let err = AggregationPropertyResource
            .create(&test_client(&server), planned())
            .await
            .unwrap_err();

        put.assert_async().await;
        assert_eq!(get.hits_async().await, 2);
        assert!(matches!(err, ProviderError::PostCondition(_)));
    }

    #[tokio::test]
    async fn test_update_preserves_sibling_properties() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc");
                then.status(200).json_body(json!({
                    "ok": true,
                    "blueprint": {
                        "identifier": "svc",
                        "schema": {
                            "properties": {
                                "language": {"type": "string", "title": "Language"}
                            },
                            "required": []
                        },
                        "aggregationProperties": {
                            "podCount": {
                                "target": "pod",
                                "calculationSpec": {
                                    "calculationBy": "entities", "func": "count"
                                }
                            },
                            "deployFrequency": {
                                "target": "deployment",
                                "calculationSpec": {
                                    "calculationBy": "entities",
                                    "func": "average",
                                    "averageOf": "week",
                                    "measureTimeBy": "$createdAt"
                                }
                            }
                        },
                        "calculationProperties": {
                            "doubled": {"calculation": ".props.cpu * 2", "type": "number"}
                        }
                    }
                }));
            })
            .await;
        // The written document must carry the schema and the unrelated
        // aggregation/calculation keys through unchanged
        let put = server
            .mock_async(|when, then| {
                when.method(PUT).path("/v1/blueprints/svc").json_body_includes(
                    r#"{
                        "schema": {
                            "properties": {
                                "language": {"type": "string", "title": "Language"}
                            }
                        },
                        "aggregationProperties": {
                            "podCount": {
                                "target": "pod",
                                "calculationSpec": {
                                    "calculationBy": "entities", "func": "count"
                                }
                            },
                            "deployFrequency": {
                                "target": "deployment",
                                "calculationSpec": {
                                    "calculationBy": "entities",
                                    "func": "average",
                                    "averageOf": "week",
                                    "measureTimeBy": "$createdAt"
                                }
                            }
                        },
                        "calculationProperties": {
                            "doubled": {"calculation": ".props.cpu * 2", "type": "number"}
                        }
                    }"#,
                );
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;

        let state = AggregationPropertyResource
            .update(&test_client(&server), planned(), Value::Null)
            .await
            .unwrap();

        put.assert_async().await;
        assert_eq!(state["target_blueprint_identifier"], "pod");
        assert_eq!(state["method"]["count_entities"], true);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_parent() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc");
                then.status(404)
                    .json_body(json!({"ok": false, "error": "not_found"}));
            })
            .await;

        let err = AggregationPropertyResource
            .create(&test_client(&server), planned())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
        assert!(err.to_string().contains("blueprint svc does not exist"));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_key() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc");
                then.status(200).json_body(json!({
                    "ok": true,
                    "blueprint": {
                        "identifier": "svc",
                        "aggregationProperties": {"podCount": {
                            "target": "pod",
                            "calculationSpec": {"calculationBy": "entities", "func": "count"}
                        }}
                    }
                }));
            })
            .await;

        let err = AggregationPropertyResource
            .create(&test_client(&server), planned())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_delete_fails_when_key_persists() {
        let server = MockServer::start_async().await;
        let get = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc");
                then.status(200).json_body(json!({
                    "ok": true,
                    "blueprint": {
                        "identifier": "svc",
                        "aggregationProperties": {"podCount": {
                            "target": "pod",
                            "calculationSpec": {"calculationBy": "entities", "func": "count"}
                        }}
                    }
                }));
            })
            .await;
        // The PUT claims success but the re-read still carries the key
        let put = server
            .mock_async(|when, then| {
                when.method(PUT).path("/v1/blueprints/svc");
                then.status(200).json_body(json!({
                    "ok": true,
                    "blueprint": {"identifier": "svc"}
                }));
            })
            .await;

        let err = AggregationPropertyResource
            .delete(&test_client(&server), planned())
            .await
            .unwrap_err();

        put.assert_async().await;
        assert_eq!(get.hits_async().await, 2);
        assert!(matches!(err, ProviderError::PostCondition(_)));
    }

    #[tokio::test]
    async fn test_delete_of_absent_key_skips_the_write() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc");
                then.status(200).json_body(json!({
                    "ok": true,
                    "blueprint": {"identifier": "svc"}
                }));
            })
            .await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT).path("/v1/blueprints/svc");
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;

        AggregationPropertyResource
            .delete(&test_client(&server), planned())
            .await
            .unwrap();
        assert_eq!(put.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_delete_of_gone_parent_is_a_no_op() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc");
                then.status(404)
                    .json_body(json!({"ok": false, "error": "not_found"}));
            })
            .await;

        AggregationPropertyResource
            .delete(&test_client(&server), planned())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_read_missing_key_drops_state() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc");
                then.status(200).json_body(json!({
                    "ok": true,
                    "blueprint": {"identifier": "svc"}
                }));
            })
            .await;

        let result = AggregationPropertyResource
            .read(&test_client(&server), planned())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_import_composite_id() {
        let state = AggregationPropertyResource.import("svc:podCount").unwrap();
        assert_eq!(state["blueprint_identifier"], "svc");
        assert_eq!(state["aggregation_identifier"], "podCount");
    }

    #[test]
    fn test_validate_requires_exactly_one_method() {
        let diags = AggregationPropertyResource.validate(&json!({
            "blueprint_identifier": "svc",
            "aggregation_identifier": "podCount",
            "target_blueprint_identifier": "pod",
            "method": {}
        }));
        assert!(diags
            .iter()
            .any(|d| d.summary.contains("exactly one aggregation method")));
    }
}
