//! The `port_page` resource (beta).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::PortClient;
use crate::config;
use crate::error::ProviderError;
use crate::models::page::{PageState, HOME_PAGE_ID};
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::translate::page::{page_to_body, refresh_page_state};
use crate::validation;

use super::{decode_state, encode_state, ensure_beta_enabled, Resource};

/// Catalog and dashboard pages. Beta-gated.
#[derive(Debug, Default)]
pub struct PageResource;

#[async_trait]
impl Resource for PageResource {
    fn type_name(&self) -> &'static str {
        "port_page"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("identifier", Attribute::required_string())
            .with_attribute(
                "type",
                Attribute::required_string().with_enum_values([
                    "blueprint-entities",
                    "dashboard",
                    "home",
                ]),
            )
            .with_attribute("title", Attribute::optional_string())
            .with_attribute("icon", Attribute::optional_string())
            .with_attribute("locked", Attribute::optional_bool())
            .with_attribute("blueprint", Attribute::optional_string())
            .with_attribute("after", Attribute::optional_string())
            .with_attribute("parent", Attribute::optional_string())
            .with_attribute(
                "widgets",
                Attribute::optional_string_list().with_semantic_json(),
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

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);
        if !config::beta_features_enabled() {
            diagnostics.push(
                Diagnostic::error("port_page is a beta resource").with_detail(format!(
                    "Set {}=true to manage pages",
                    config::ENV_BETA_FEATURES
                )),
            );
        }
        diagnostics
    }

    async fn read(
        &self,
        client: &PortClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let mut state: PageState = decode_state(state)?;
        let (wire, _status) = client.get_page(&state.identifier).await?;
        let Some(wire) = wire else {
            return Ok(None);
        };
        refresh_page_state(&mut state, &wire, client.json_escape_html())?;
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        ensure_beta_enabled(self.type_name())?;
        let mut state: PageState = decode_state(planned)?;
        let body = page_to_body(&state)?;
        let (wire, _status) = client.create_page(&body).await?;
        // Page creation currently answers with an empty body
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client.get_page(&state.identifier).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "page {} missing after create",
                        state.identifier
                    ))
                })?
            },
        };
        refresh_page_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        ensure_beta_enabled(self.type_name())?;
        let mut state: PageState = decode_state(planned)?;
        let body = page_to_body(&state)?;
        let (wire, _status) = client.update_page(&state.identifier, &body).await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client.get_page(&state.identifier).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "page {} missing after update",
                        state.identifier
                    ))
                })?
            },
        };
        refresh_page_state(&mut state, &wire, client.json_escape_html())?;
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError> {
        let state: PageState = decode_state(state)?;
        // The home page cannot be deleted; dropping it from state is enough
        if state.identifier == HOME_PAGE_ID {
            return Ok(());
        }
        client.delete_page(&state.identifier).await?;
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::InvalidImportId(
                "expected a page identifier or $home".to_string(),
            ));
        }
        Ok(json!({ "identifier": id, "type": "" }))
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
    async fn test_home_page_delete_is_state_drop_only() {
        // No mock registered: any request would fail the test
        let server = MockServer::start_async().await;
        PageResource
            .delete(
                &test_client(&server),
                json!({"identifier": "$home", "type": "home"}),
            )
            .await
            .unwrap();
    }

    #[test]
    fn test_import_accepts_home_literal() {
        let state = PageResource.import("$home").unwrap();
        assert_eq!(state["identifier"], "$home");
    }

    #[test]
    fn test_validate_flags_missing_beta_gate() {
        if std::env::var(config::ENV_BETA_FEATURES).is_ok() {
            return;
        }
        let diagnostics = PageResource.validate(&json!({
            "identifier": "microservices",
            "type": "blueprint-entities"
        }));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("beta"));
    }
}
