//! The `port_integration` resource.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::PortClient;
use crate::error::ProviderError;
use crate::models::integration::IntegrationState;
use crate::schema::{Attribute, Schema};
use crate::translate::integration::{integration_to_body, refresh_integration_state};

use super::{decode_state, encode_state, Resource};

/// Exporter/agent integration installations.
#[derive(Debug, Default)]
pub struct IntegrationResource;

#[async_trait]
impl Resource for IntegrationResource {
    fn type_name(&self) -> &'static str {
        "port_integration"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("installation_id", Attribute::required_string())
            .with_attribute("title", Attribute::optional_string())
            .with_attribute("installation_app_type", Attribute::optional_string())
            .with_attribute("version", Attribute::optional_string())
            .with_attribute("config", Attribute::optional_string().with_semantic_json())
            .with_attribute("kafka_changelog_destination", Attribute::optional_bool())
            .with_attribute("webhook_changelog_destination_url", Attribute::optional_string())
            .with_attribute("webhook_changelog_destination_agent", Attribute::optional_bool())
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
        let mut state: IntegrationState = decode_state(state)?;
        let (wire, _status) = client.get_integration(&state.installation_id).await?;
        let Some(wire) = wire else {
            return Ok(None);
        };
        refresh_integration_state(&mut state, &wire, client.json_escape_html())?;
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        let mut state: IntegrationState = decode_state(planned)?;
        let body = integration_to_body(&state)?;
        let (wire, _status) = client.create_integration(&body).await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) =
                    client.get_integration(&state.installation_id).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "integration {} missing after create",
                        state.installation_id
                    ))
                })?
            },
        };
        refresh_integration_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: IntegrationState = decode_state(planned)?;
        let body = integration_to_body(&state)?;
        let (wire, _status) = client
            .update_integration(&state.installation_id, &body)
            .await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) =
                    client.get_integration(&state.installation_id).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "integration {} missing after update",
                        state.installation_id
                    ))
                })?
            },
        };
        refresh_integration_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError> {
        let state: IntegrationState = decode_state(state)?;
        client.delete_integration(&state.installation_id).await?;
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::InvalidImportId(
                "expected an installation id".to_string(),
            ));
        }
        Ok(json!({ "installation_id": id }))
    }
}
