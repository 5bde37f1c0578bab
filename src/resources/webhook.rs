//! The `port_webhook` resource.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::PortClient;
use crate::error::ProviderError;
use crate::models::webhook::WebhookState;
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::translate::webhook::{refresh_webhook_state, webhook_to_body};

use super::{decode_state, encode_state, Resource};

/// Ingestion webhooks.
#[derive(Debug, Default)]
pub struct WebhookResource;

#[async_trait]
impl Resource for WebhookResource {
    fn type_name(&self) -> &'static str {
        "port_webhook"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("identifier", Attribute::required_string())
            .with_attribute("title", Attribute::optional_string())
            .with_attribute("icon", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("enabled", Attribute::optional_bool())
            .with_block(
                "security",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("secret", Attribute::optional_string().sensitive())
                        .with_attribute("signature_header_name", Attribute::optional_string())
                        .with_attribute("signature_algorithm", Attribute::optional_string())
                        .with_attribute("signature_prefix", Attribute::optional_string())
                        .with_attribute("request_identifier_path", Attribute::optional_string()),
                ),
            )
            .with_block(
                "mappings",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("blueprint", Attribute::required_string())
                        .with_attribute(
                            "filter",
                            Attribute::optional_string().with_semantic_json(),
                        )
                        .with_attribute("items_to_parse", Attribute::optional_string()),
                ),
            )
            .with_attribute("url", Attribute::computed_string().with_use_state_for_unknown())
            .with_attribute(
                "webhook_key",
                Attribute::computed_string().with_use_state_for_unknown(),
            )
            .with_attribute(
                "created_at",
                Attribute::computed_string().with_use_state_for_unknown(),
            )
            .with_attribute(
                "updated_at",
                Attribute::computed_string().with_use_state_for_unknown(),
            )
    }

    async fn read(
        &self,
        client: &PortClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let mut state: WebhookState = decode_state(state)?;
        let (wire, _status) = client.get_webhook(&state.identifier).await?;
        let Some(wire) = wire else {
            return Ok(None);
        };
        refresh_webhook_state(&mut state, &wire, client.json_escape_html())?;
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        let mut state: WebhookState = decode_state(planned)?;
        let body = webhook_to_body(&state)?;
        let (wire, _status) = client.create_webhook(&body).await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client.get_webhook(&state.identifier).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "webhook {} missing after create",
                        state.identifier
                    ))
                })?
            },
        };
        refresh_webhook_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: WebhookState = decode_state(planned)?;
        let body = webhook_to_body(&state)?;
        let (wire, _status) = client.update_webhook(&state.identifier, &body).await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client.get_webhook(&state.identifier).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "webhook {} missing after update",
                        state.identifier
                    ))
                })?
            },
        };
        refresh_webhook_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError> {
        let state: WebhookState = decode_state(state)?;
        client.delete_webhook(&state.identifier).await?;
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::InvalidImportId(
                "expected a webhook identifier".to_string(),
            ));
        }
        Ok(json!({ "identifier": id }))
    }
}
