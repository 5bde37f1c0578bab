//! The `port_scorecard` resource.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::PortClient;
use crate::error::ProviderError;
use crate::models::scorecard::ScorecardState;
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::translate::scorecard::{refresh_scorecard_state, scorecard_to_body};

use super::{composite_id, decode_state, encode_state, Resource};

/// Scorecards, scoped under their blueprint.
#[derive(Debug, Default)]
pub struct ScorecardResource;

#[async_trait]
impl Resource for ScorecardResource {
    fn type_name(&self) -> &'static str {
        "port_scorecard"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("identifier", Attribute::required_string())
            .with_attribute("blueprint", Attribute::required_string())
            .with_attribute("title", Attribute::required_string())
            .with_block(
                "rules",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("identifier", Attribute::required_string())
                        .with_attribute("title", Attribute::required_string())
                        .with_attribute("level", Attribute::required_string())
                        .with_attribute("description", Attribute::optional_string()),
                ),
            )
            .with_block(
                "levels",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("title", Attribute::required_string())
                        .with_attribute("color", Attribute::optional_string()),
                ),
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
        let mut state: ScorecardState = decode_state(state)?;
        let (wire, _status) = client
            .get_scorecard(&state.blueprint, &state.identifier)
            .await?;
        let Some(wire) = wire else {
            return Ok(None);
        };
        refresh_scorecard_state(&mut state, &wire, client.json_escape_html())?;
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        let mut state: ScorecardState = decode_state(planned)?;
        let body = scorecard_to_body(&state)?;
        let (wire, _status) = client.create_scorecard(&state.blueprint, &body).await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client
                    .get_scorecard(&state.blueprint, &state.identifier)
                    .await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "scorecard {} missing after create",
                        state.identifier
                    ))
                })?
            },
        };
        refresh_scorecard_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: ScorecardState = decode_state(planned)?;
        let body = scorecard_to_body(&state)?;
        let (wire, _status) = client
            .update_scorecard(&state.blueprint, &state.identifier, &body)
            .await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client
                    .get_scorecard(&state.blueprint, &state.identifier)
                    .await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "scorecard {} missing after update",
                        state.identifier
                    ))
                })?
            },
        };
        refresh_scorecard_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError> {
        let state: ScorecardState = decode_state(state)?;
        client
            .delete_scorecard(&state.blueprint, &state.identifier)
            .await?;
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let (blueprint, scorecard) = composite_id(id, "blueprint_id:scorecard_id")?;
        Ok(json!({
            "blueprint": blueprint,
            "identifier": scorecard,
            "title": ""
        }))
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
    async fn test_read_is_scoped_under_blueprint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc/scorecards/ownership");
                then.status(200).json_body(json!({
                    "ok": true,
                    "scorecard": {
                        "identifier": "ownership",
                        "title": "Ownership",
                        "rules": []
                    }
                }));
            })
            .await;

        let state = ScorecardResource
            .read(
                &test_client(&server),
                json!({"identifier": "ownership", "blueprint": "svc", "title": "Ownership"}),
            )
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(state["blueprint"], "svc");
        assert_eq!(state["title"], "Ownership");
    }

    #[test]
    fn test_import_composite_id() {
        let state = ScorecardResource.import("svc:ownership").unwrap();
        assert_eq!(state["blueprint"], "svc");
        assert_eq!(state["identifier"], "ownership");
        assert!(ScorecardResource.import("ownership").is_err());
    }
}
