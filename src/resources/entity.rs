//! The `port_entity` resource.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::{CreateEntityOptions, PortClient};
use crate::error::ProviderError;
use crate::models::entity::EntityState;
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::translate::entity::{entity_to_body, refresh_entity_state};

use super::{composite_id, decode_state, encode_state, Resource};

/// Entities: instances of a blueprint.
#[derive(Debug, Default)]
pub struct EntityResource;

#[async_trait]
impl Resource for EntityResource {
    fn type_name(&self) -> &'static str {
        "port_entity"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("identifier", Attribute::optional_string())
            .with_attribute("blueprint", Attribute::required_string())
            .with_attribute("title", Attribute::optional_string())
            .with_attribute("icon", Attribute::optional_string())
            .with_attribute("run_id", Attribute::optional_string())
            .with_attribute("create_missing_related_entities", Attribute::optional_bool())
            .with_attribute("delete_dependents", Attribute::optional_bool())
            .with_attribute("teams", Attribute::optional_string_list())
            .with_block(
                "properties",
                NestedBlock::single(Block::new()),
            )
            .with_block(
                "relations",
                NestedBlock::single(
                    Block::new()
                        .with_block("single_relations", NestedBlock::map(Block::new()))
                        .with_block("many_relations", NestedBlock::map(Block::new())),
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
        let mut state: EntityState = decode_state(state)?;
        let Some(identifier) = state.identifier.as_known().cloned() else {
            return Ok(None);
        };
        let (wire, _status) = client.get_entity(&state.blueprint, &identifier).await?;
        let Some(wire) = wire else {
            return Ok(None);
        };
        refresh_entity_state(&mut state, &wire, client.json_escape_html())?;
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        let mut state: EntityState = decode_state(planned)?;
        let body = entity_to_body(&state)?;
        let options = CreateEntityOptions {
            run_id: state.run_id.to_body().cloned(),
            create_missing_related_entities: state
                .create_missing_related_entities
                .to_body()
                .copied()
                .unwrap_or(false),
        };
        let (wire, _status) = client.create_entity(&state.blueprint, &body, &options).await?;
        let wire = wire.ok_or_else(|| {
            ProviderError::PostCondition(format!(
                "entity of blueprint {} missing after create",
                state.blueprint
            ))
        })?;
        refresh_entity_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: EntityState = decode_state(planned)?;
        let identifier = state.identifier.as_known().cloned().ok_or_else(|| {
            ProviderError::Validation("entity update requires a known identifier".to_string())
        })?;
        let body = entity_to_body(&state)?;
        let (wire, _status) = client
            .update_entity(&state.blueprint, &identifier, &body)
            .await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) =
                    client.get_entity(&state.blueprint, &identifier).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "entity {identifier} missing after update"
                    ))
                })?
            },
        };
        refresh_entity_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError> {
        let state: EntityState = decode_state(state)?;
        let Some(identifier) = state.identifier.as_known() else {
            return Ok(());
        };
        let delete_dependents = state.delete_dependents.to_body().copied().unwrap_or(false);
        client
            .delete_entity_with_flag(&state.blueprint, identifier, delete_dependents)
            .await?;
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let (blueprint, entity) = composite_id(id, "blueprint_id:entity_id")?;
        Ok(json!({ "blueprint": blueprint, "identifier": entity }))
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
    async fn test_create_adopts_generated_identifier() {
        let server = MockServer::start_async().await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/blueprints/svc/entities")
                    .query_param("upsert", "true");
                then.status(201).json_body(json!({
                    "ok": true,
                    "entity": {"identifier": "e_generated", "blueprint": "svc", "title": "DB"}
                }));
            })
            .await;

        let state = EntityResource
            .create(
                &test_client(&server),
                json!({"blueprint": "svc", "title": "DB"}),
            )
            .await
            .unwrap();

        post.assert_async().await;
        assert_eq!(state["identifier"], "e_generated");
    }

    #[tokio::test]
    async fn test_delete_passes_dependents_flag() {
        let server = MockServer::start_async().await;
        let del = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/v1/blueprints/svc/entities/db")
                    .query_param("delete_dependents", "true");
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;

        EntityResource
            .delete(
                &test_client(&server),
                json!({
                    "blueprint": "svc",
                    "identifier": "db",
                    "delete_dependents": true
                }),
            )
            .await
            .unwrap();
        del.assert_async().await;
    }

    #[test]
    fn test_import_composite_id() {
        let state = EntityResource.import("svc:db").unwrap();
        assert_eq!(state, json!({"blueprint": "svc", "identifier": "db"}));
        assert!(EntityResource.import("svc").is_err());
    }

    #[tokio::test]
    async fn test_read_without_identifier_drops_state() {
        let server = MockServer::start_async().await;
        let result = EntityResource
            .read(&test_client(&server), json!({"blueprint": "svc"}))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
