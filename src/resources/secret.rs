//! The `port_organization_secret` resource.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::PortClient;
use crate::error::ProviderError;
use crate::models::secret::OrganizationSecretState;
use crate::schema::{Attribute, Schema};
use crate::translate::secret::{
    description_cleared, organization_secret_to_body, refresh_organization_secret_state,
};
use crate::types::Field;

use super::{decode_state, encode_state, Resource};

/// Organization secrets. The name is the identity and cannot be renamed in
/// place; reads never return the value.
#[derive(Debug, Default)]
pub struct OrganizationSecretResource;

#[async_trait]
impl Resource for OrganizationSecretResource {
    fn type_name(&self) -> &'static str {
        "port_organization_secret"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "secret_name",
                Attribute::required_string().with_requires_replace(),
            )
            .with_attribute("secret_value", Attribute::required_string().sensitive())
            .with_attribute("description", Attribute::optional_string())
    }

    async fn read(
        &self,
        client: &PortClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let mut state: OrganizationSecretState = decode_state(state)?;
        let (wire, _status) = client.get_organization_secret(&state.secret_name).await?;
        let Some(wire) = wire else {
            return Ok(None);
        };
        refresh_organization_secret_state(&mut state, &wire);
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        let mut state: OrganizationSecretState = decode_state(planned)?;
        let body = organization_secret_to_body(&state);
        let (wire, _status) = client.create_organization_secret(&body).await?;
        if let Some(wire) = wire {
            refresh_organization_secret_state(&mut state, &wire);
        }
        Ok(encode_state(&state)?)
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: OrganizationSecretState = decode_state(planned)?;
        let prior: OrganizationSecretState = decode_state(prior)?;
        let mut body = organization_secret_to_body(&state);
        if description_cleared(&prior.description, &state.description) {
            body.description = Field::Null;
        }
        let (wire, _status) = client
            .update_organization_secret(&state.secret_name, &body)
            .await?;
        if let Some(wire) = wire {
            refresh_organization_secret_state(&mut state, &wire);
        }
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError> {
        let state: OrganizationSecretState = decode_state(state)?;
        client.delete_organization_secret(&state.secret_name).await?;
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::InvalidImportId(
                "expected a secret name".to_string(),
            ));
        }
        // The value is never readable; an imported secret adopts it on the
        // next apply
        Ok(json!({ "secret_name": id, "secret_value": "" }))
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
    async fn test_update_sends_explicit_null_for_cleared_description() {
        let server = MockServer::start_async().await;
        let patch = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/v1/organization/secrets/slack-token")
                    .json_body(json!({
                        "secretName": "slack-token",
                        "secretValue": "xoxb-2",
                        "description": null
                    }));
                then.status(200).json_body(json!({
                    "ok": true,
                    "secret": {"secretName": "slack-token"}
                }));
            })
            .await;

        let state = OrganizationSecretResource
            .update(
                &test_client(&server),
                json!({"secret_name": "slack-token", "secret_value": "xoxb-2"}),
                json!({
                    "secret_name": "slack-token",
                    "secret_value": "xoxb-1",
                    "description": "Bot token"
                }),
            )
            .await
            .unwrap();

        patch.assert_async().await;
        assert_eq!(state["secret_value"], "xoxb-2");
    }

    #[tokio::test]
    async fn test_read_keeps_local_value() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/organization/secrets/slack-token");
                then.status(200).json_body(json!({
                    "ok": true,
                    "secret": {"secretName": "slack-token", "description": "Bot token"}
                }));
            })
            .await;

        let state = OrganizationSecretResource
            .read(
                &test_client(&server),
                json!({"secret_name": "slack-token", "secret_value": "xoxb-1"}),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state["secret_value"], "xoxb-1");
        assert_eq!(state["description"], "Bot token");
    }
}
