//! The `port_blueprint` resource.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::client::PortClient;
use crate::error::ProviderError;
use crate::models::blueprint::BlueprintState;
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::translate::blueprint::{blueprint_to_body, refresh_blueprint_state};

use super::{decode_state, encode_state, Resource};

/// Blueprints: the schema documents other kinds hang off.
#[derive(Debug, Default)]
pub struct BlueprintResource;

fn property_block() -> Block {
    Block::new()
        .with_attribute("title", Attribute::optional_string())
        .with_attribute("icon", Attribute::optional_string())
        .with_attribute("description", Attribute::optional_string())
        .with_attribute("required", Attribute::optional_bool())
}

#[async_trait]
impl Resource for BlueprintResource {
    fn type_name(&self) -> &'static str {
        "port_blueprint"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("identifier", Attribute::required_string())
            .with_attribute("title", Attribute::optional_string())
            .with_attribute("icon", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("create_catalog_page", Attribute::optional_bool())
            .with_attribute("force_delete_entities", Attribute::optional_bool())
            .with_block(
                "properties",
                NestedBlock::single(
                    Block::new()
                        .with_block("string_props", NestedBlock::map(property_block()))
                        .with_block("number_props", NestedBlock::map(property_block()))
                        .with_block("boolean_props", NestedBlock::map(property_block()))
                        .with_block("array_props", NestedBlock::map(property_block()))
                        .with_block("object_props", NestedBlock::map(property_block())),
                ),
            )
            .with_block(
                "relations",
                NestedBlock::map(
                    Block::new()
                        .with_attribute("target", Attribute::required_string())
                        .with_attribute("title", Attribute::optional_string())
                        .with_attribute("required", Attribute::optional_bool())
                        .with_attribute("many", Attribute::optional_bool()),
                ),
            )
            .with_attribute(
                "created_at",
                Attribute::computed_string().with_use_state_for_unknown(),
            )
            .with_attribute(
                "created_by",
                Attribute::computed_string().with_use_state_for_unknown(),
            )
            .with_attribute(
                "updated_at",
                Attribute::computed_string().with_use_state_for_unknown(),
            )
            .with_attribute(
                "updated_by",
                Attribute::computed_string().with_use_state_for_unknown(),
            )
    }

    async fn read(
        &self,
        client: &PortClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let mut state: BlueprintState = decode_state(state)?;
        let (wire, _status) = client.get_blueprint(&state.identifier).await?;
        let Some(wire) = wire else {
            debug!(
                target: "port_provider::resources",
                identifier = %state.identifier, "blueprint gone; dropping from state"
            );
            return Ok(None);
        };
        refresh_blueprint_state(&mut state, &wire, client.json_escape_html())?;
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        let mut state: BlueprintState = decode_state(planned)?;
        let body = blueprint_to_body(&state)?;
        let create_catalog_page = state.create_catalog_page.to_body().copied();
        let (wire, _status) = client.create_blueprint(&body, create_catalog_page).await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client.get_blueprint(&state.identifier).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "blueprint {} missing after create",
                        state.identifier
                    ))
                })?
            },
        };
        refresh_blueprint_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: BlueprintState = decode_state(planned)?;
        let mut body = blueprint_to_body(&state)?;

        // Aggregation properties are managed by their own resource; the PUT
        // replaces the whole document, so the server's map is carried over.
        // Calculation properties likewise when none are declared inline.
        let (current, _status) = client.get_blueprint(&state.identifier).await?;
        if let Some(current) = current {
            body.aggregation_properties = current.aggregation_properties;
            if state.calculation_properties.is_empty() {
                body.calculation_properties = current.calculation_properties;
            }
        }

        let (wire, _status) = client.update_blueprint(&state.identifier, &body).await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client.get_blueprint(&state.identifier).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "blueprint {} missing after update",
                        state.identifier
                    ))
                })?
            },
        };
        refresh_blueprint_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError> {
        let state: BlueprintState = decode_state(state)?;
        if state.force_delete_entities.to_body().copied().unwrap_or(false) {
            if let Some(migration_id) = client
                .delete_blueprint_with_all_entities(&state.identifier)
                .await?
            {
                client.wait_for_migration(&migration_id).await?;
            }
        } else {
            client.delete_blueprint(&state.identifier).await?;
        }
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::InvalidImportId(
                "expected a blueprint identifier".to_string(),
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

    #[tokio::test]
    async fn test_create_shapes_wire_body_and_adopts_computed_fields() {
        let server = MockServer::start_async().await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/blueprints").json_body_includes(
                    r#"{
                        "identifier": "svc",
                        "title": "Service",
                        "schema": {
                            "properties": {"language": {"type": "string", "title": "Language"}},
                            "required": []
                        }
                    }"#,
                );
                then.status(200).json_body(json!({
                    "ok": true,
                    "blueprint": {
                        "identifier": "svc",
                        "title": "Service",
                        "schema": {
                            "properties": {"language": {"type": "string", "title": "Language"}},
                            "required": []
                        },
                        "createdAt": "2024-01-01T00:00:00Z",
                        "createdBy": "me"
                    }
                }));
            })
            .await;

        let state = BlueprintResource
            .create(
                &test_client(&server),
                json!({
                    "identifier": "svc",
                    "title": "Service",
                    "properties": {
                        "string_props": {"language": {"title": "Language"}}
                    }
                }),
            )
            .await
            .unwrap();

        post.assert_async().await;
        assert_eq!(state["identifier"], "svc");
        assert_eq!(state["title"], "Service");
        assert_eq!(state["created_at"], "2024-01-01T00:00:00Z");
        assert_eq!(
            state["properties"]["string_props"]["language"]["title"],
            "Language"
        );
    }

    #[tokio::test]
    async fn test_read_gone_drops_state() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/gone");
                then.status(404).json_body(json!({"ok": false}));
            })
            .await;

        let result = BlueprintResource
            .read(&test_client(&server), json!({"identifier": "gone"}))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_carries_server_aggregations() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc");
                then.status(200).json_body(json!({
                    "ok": true,
                    "blueprint": {
                        "identifier": "svc",
                        "schema": {"properties": {}, "required": []},
                        "aggregationProperties": {
                            "childCount": {"target": "child", "calculationSpec": {
                                "func": "count", "calculationBy": "entities"
                            }}
                        }
                    }
                }));
            })
            .await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/v1/blueprints/svc")
                    .json_body_includes(
                        r#"{"aggregationProperties": {"childCount": {"target": "child"}}}"#,
                    );
                then.status(200).json_body(json!({
                    "ok": true,
                    "blueprint": {
                        "identifier": "svc",
                        "title": "Service",
                        "schema": {"properties": {}, "required": []}
                    }
                }));
            })
            .await;

        let state = BlueprintResource
            .update(
                &test_client(&server),
                json!({"identifier": "svc", "title": "Service"}),
                json!({"identifier": "svc"}),
            )
            .await
            .unwrap();

        put.assert_async().await;
        assert_eq!(state["title"], "Service");
    }

    #[tokio::test]
    async fn test_delete_with_cascade_waits_for_migration() {
        let server = MockServer::start_async().await;
        let cascade = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/v1/blueprints/svc/all-entities")
                    .query_param("delete_blueprint", "true");
                then.status(200)
                    .json_body(json!({"ok": true, "migration": {"id": "mig_1"}}));
            })
            .await;
        let migration = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/migrations/mig_1");
                then.status(200).json_body(json!({
                    "ok": true,
                    "migration": {"id": "mig_1", "status": "COMPLETE"}
                }));
            })
            .await;

        BlueprintResource
            .delete(
                &test_client(&server),
                json!({"identifier": "svc", "force_delete_entities": true}),
            )
            .await
            .unwrap();

        cascade.assert_async().await;
        migration.assert_async().await;
    }

    #[test]
    fn test_import_simple_id() {
        let state = BlueprintResource.import("service").unwrap();
        assert_eq!(state, json!({"identifier": "service"}));
        assert!(BlueprintResource.import("").is_err());
    }
}
