//! The three permissions resources.
//!
//! The SaaS treats permissions documents as permanent: they exist as long as
//! their subject does and cannot be deleted. Create and update are both a
//! PATCH of the whole document; delete only drops orchestrator state.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::PortClient;
use crate::error::ProviderError;
use crate::models::permissions::{
    ActionPermissionsState, BlueprintPermissionsState, PagePermissionsState,
};
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema};
use crate::translate::permissions::{
    action_permissions_to_body, blueprint_permissions_to_body, page_permissions_to_body,
    refresh_action_permissions_state, refresh_blueprint_permissions_state,
    refresh_page_permissions_state, validate_update_property_keys,
};
use crate::validation;

use super::{composite_id, decode_state, encode_state, Resource};

fn assignees_block() -> Block {
    Block::new()
        .with_attribute("users", Attribute::optional_string_list())
        .with_attribute("roles", Attribute::optional_string_list())
        .with_attribute("teams", Attribute::optional_string_list())
        .with_attribute("owned_by_team", Attribute::optional_bool())
}

// -------------------------------------------------------------------------
// Action permissions
// -------------------------------------------------------------------------

/// Execute/approve ACLs of one action.
#[derive(Debug, Default)]
pub struct ActionPermissionsResource;

#[async_trait]
impl Resource for ActionPermissionsResource {
    fn type_name(&self) -> &'static str {
        "port_action_permissions"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("action_identifier", Attribute::required_string())
            .with_attribute("blueprint_identifier", Attribute::required_string())
            .with_block(
                "execute",
                NestedBlock::single(
                    assignees_block().with_attribute("policy", Attribute::optional_string()),
                ),
            )
            .with_block(
                "approve",
                NestedBlock::single(
                    assignees_block().with_attribute("policy", Attribute::optional_string()),
                ),
            )
    }

    async fn read(
        &self,
        client: &PortClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let mut state: ActionPermissionsState = decode_state(state)?;
        let (wire, _status) = client
            .get_action_permissions(&state.blueprint_identifier, &state.action_identifier)
            .await?;
        let Some(wire) = wire else {
            return Ok(None);
        };
        refresh_action_permissions_state(&mut state, &wire, client.json_escape_html())?;
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        self.update(client, planned, Value::Null).await
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: ActionPermissionsState = decode_state(planned)?;
        let body = action_permissions_to_body(&state)?;
        let (wire, _status) = client
            .update_action_permissions(
                &state.blueprint_identifier,
                &state.action_identifier,
                &body,
            )
            .await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client
                    .get_action_permissions(
                        &state.blueprint_identifier,
                        &state.action_identifier,
                    )
                    .await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "permissions of action {} missing after write",
                        state.action_identifier
                    ))
                })?
            },
        };
        refresh_action_permissions_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, _client: &PortClient, _state: Value) -> Result<(), ProviderError> {
        // The server-side ACL persists; only orchestrator state is dropped
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let (blueprint, action) = composite_id(id, "blueprint_id:action_id")?;
        Ok(json!({
            "blueprint_identifier": blueprint,
            "action_identifier": action
        }))
    }
}

// -------------------------------------------------------------------------
// Blueprint permissions
// -------------------------------------------------------------------------

/// Per-operation entity ACLs of one blueprint.
#[derive(Debug, Default)]
pub struct BlueprintPermissionsResource;

#[async_trait]
impl Resource for BlueprintPermissionsResource {
    fn type_name(&self) -> &'static str {
        "port_blueprint_permissions"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("blueprint_identifier", Attribute::required_string())
            .with_block(
                "entities",
                NestedBlock::single(
                    Block::new()
                        .with_block("register", NestedBlock::single(assignees_block()))
                        .with_block("unregister", NestedBlock::single(assignees_block()))
                        .with_block("update", NestedBlock::single(assignees_block()))
                        .with_block("update_properties", NestedBlock::map(assignees_block()))
                        .with_block(
                            "update_metadata_properties",
                            NestedBlock::single(
                                Block::new()
                                    .with_block("title", NestedBlock::single(assignees_block()))
                                    .with_block(
                                        "identifier",
                                        NestedBlock::single(assignees_block()),
                                    )
                                    .with_block("icon", NestedBlock::single(assignees_block()))
                                    .with_block("team", NestedBlock::single(assignees_block())),
                            ),
                        )
                        .with_block("update_relations", NestedBlock::map(assignees_block())),
                ),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);
        validation::validate_no_reserved_keys(
            config.pointer("/entities/update_properties"),
            "entities.update_properties",
            &mut diagnostics,
        );
        diagnostics
    }

    async fn read(
        &self,
        client: &PortClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let mut state: BlueprintPermissionsState = decode_state(state)?;
        let (wire, _status) = client
            .get_blueprint_permissions(&state.blueprint_identifier)
            .await?;
        let Some(wire) = wire else {
            return Ok(None);
        };
        refresh_blueprint_permissions_state(&mut state, &wire);
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        self.update(client, planned, Value::Null).await
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: BlueprintPermissionsState = decode_state(planned)?;
        validate_update_property_keys(&state)?;
        let body = blueprint_permissions_to_body(&state)?;
        let (wire, _status) = client
            .update_blueprint_permissions(&state.blueprint_identifier, &body)
            .await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client
                    .get_blueprint_permissions(&state.blueprint_identifier)
                    .await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "permissions of blueprint {} missing after write",
                        state.blueprint_identifier
                    ))
                })?
            },
        };
        refresh_blueprint_permissions_state(&mut state, &wire);
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, _client: &PortClient, _state: Value) -> Result<(), ProviderError> {
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::InvalidImportId(
                "expected a blueprint identifier".to_string(),
            ));
        }
        Ok(json!({ "blueprint_identifier": id }))
    }
}

// -------------------------------------------------------------------------
// Page permissions
// -------------------------------------------------------------------------

/// Read ACLs of one page.
#[derive(Debug, Default)]
pub struct PagePermissionsResource;

#[async_trait]
impl Resource for PagePermissionsResource {
    fn type_name(&self) -> &'static str {
        "port_page_permissions"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("page_identifier", Attribute::required_string())
            .with_block("read", NestedBlock::single(assignees_block()).with_min_items(1))
    }

    async fn read(
        &self,
        client: &PortClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let mut state: PagePermissionsState = decode_state(state)?;
        let (wire, _status) = client.get_page_permissions(&state.page_identifier).await?;
        let Some(wire) = wire else {
            return Ok(None);
        };
        refresh_page_permissions_state(&mut state, &wire);
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        self.update(client, planned, Value::Null).await
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: PagePermissionsState = decode_state(planned)?;
        let body = page_permissions_to_body(&state);
        let (wire, _status) = client
            .update_page_permissions(&state.page_identifier, &body)
            .await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) =
                    client.get_page_permissions(&state.page_identifier).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "permissions of page {} missing after write",
                        state.page_identifier
                    ))
                })?
            },
        };
        refresh_page_permissions_state(&mut state, &wire);
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, _client: &PortClient, _state: Value) -> Result<(), ProviderError> {
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::InvalidImportId(
                "expected a page identifier".to_string(),
            ));
        }
        Ok(json!({ "page_identifier": id, "read": {} }))
    }
}
