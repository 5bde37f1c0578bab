//! The `port_team` resource.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::PortClient;
use crate::error::ProviderError;
use crate::models::team::TeamState;
use crate::schema::{Attribute, Schema};
use crate::translate::team::{refresh_team_state, team_to_body};

use super::{decode_state, encode_state, Resource};

/// Portal teams. The name is the identity.
#[derive(Debug, Default)]
pub struct TeamResource;

#[async_trait]
impl Resource for TeamResource {
    fn type_name(&self) -> &'static str {
        "port_team"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("users", Attribute::optional_string_list())
            .with_attribute(
                "provider",
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
        let mut state: TeamState = decode_state(state)?;
        let (wire, _status) = client.get_team(&state.name).await?;
        let Some(wire) = wire else {
            return Ok(None);
        };
        refresh_team_state(&mut state, &wire);
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        let mut state: TeamState = decode_state(planned)?;
        let body = team_to_body(&state);
        let (wire, _status) = client.create_team(&body).await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client.get_team(&state.name).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "team {} missing after create",
                        state.name
                    ))
                })?
            },
        };
        refresh_team_state(&mut state, &wire);
        Ok(encode_state(&state)?)
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: TeamState = decode_state(planned)?;
        let body = team_to_body(&state);
        let (wire, _status) = client.update_team(&state.name, &body).await?;
        // The PATCH response omits the users projection; re-read for a
        // consistent refresh
        let wire = match wire {
            Some(w) if w.users.is_some() => w,
            _ => {
                let (read_back, _status) = client.get_team(&state.name).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "team {} missing after update",
                        state.name
                    ))
                })?
            },
        };
        refresh_team_state(&mut state, &wire);
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError> {
        let state: TeamState = decode_state(state)?;
        client.delete_team(&state.name).await?;
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::InvalidImportId(
                "expected a team name".to_string(),
            ));
        }
        Ok(json!({ "name": id }))
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
    async fn test_read_extracts_user_emails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/teams/platform")
                    .query_param_exists("fields");
                then.status(200).json_body(json!({
                    "ok": true,
                    "team": {
                        "name": "platform",
                        "users": [{"email": "a@example.com"}, {"email": "b@example.com"}],
                        "provider": "port"
                    }
                }));
            })
            .await;

        let state = TeamResource
            .read(
                &test_client(&server),
                json!({"name": "platform", "users": ["a@example.com"]}),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state["users"], json!(["a@example.com", "b@example.com"]));
        assert_eq!(state["provider"], "port");
    }
}
