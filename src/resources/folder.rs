//! The `port_folder` resource (beta).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::PortClient;
use crate::config;
use crate::error::ProviderError;
use crate::models::folder::FolderState;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::translate::folder::{folder_to_body, refresh_folder_state};
use crate::validation;

use super::{decode_state, encode_state, ensure_beta_enabled, Resource};

/// Sidebar folders. Beta-gated, addressed through their sidebar document.
#[derive(Debug, Default)]
pub struct FolderResource;

#[async_trait]
impl Resource for FolderResource {
    fn type_name(&self) -> &'static str {
        "port_folder"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("identifier", Attribute::required_string())
            .with_attribute("title", Attribute::optional_string())
            .with_attribute("sidebar", Attribute::optional_string())
            .with_attribute("after", Attribute::optional_string())
            .with_attribute("parent", Attribute::optional_string())
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);
        if !config::beta_features_enabled() {
            diagnostics.push(
                Diagnostic::error("port_folder is a beta resource").with_detail(format!(
                    "Set {}=true to manage folders",
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
        let mut state: FolderState = decode_state(state)?;
        let (wire, _status) = client
            .get_folder(state.sidebar_or_default(), &state.identifier)
            .await?;
        let Some(wire) = wire else {
            return Ok(None);
        };
        refresh_folder_state(&mut state, &wire);
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        ensure_beta_enabled(self.type_name())?;
        let mut state: FolderState = decode_state(planned)?;
        let body = folder_to_body(&state);
        let sidebar = state.sidebar_or_default().to_string();
        let (wire, _status) = client.create_folder(&sidebar, &body).await?;
        // Folder creation answers with an empty body; the sidebar read
        // recovers the created item
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client.get_folder(&sidebar, &state.identifier).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "folder {} missing from sidebar {sidebar} after create",
                        state.identifier
                    ))
                })?
            },
        };
        refresh_folder_state(&mut state, &wire);
        Ok(encode_state(&state)?)
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        ensure_beta_enabled(self.type_name())?;
        let mut state: FolderState = decode_state(planned)?;
        let body = folder_to_body(&state);
        let sidebar = state.sidebar_or_default().to_string();
        let (wire, _status) = client
            .update_folder(&sidebar, &state.identifier, &body)
            .await?;
        let wire = match wire {
            Some(w) => w,
            None => {
                let (read_back, _status) = client.get_folder(&sidebar, &state.identifier).await?;
                read_back.ok_or_else(|| {
                    ProviderError::PostCondition(format!(
                        "folder {} missing from sidebar {sidebar} after update",
                        state.identifier
                    ))
                })?
            },
        };
        refresh_folder_state(&mut state, &wire);
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError> {
        let state: FolderState = decode_state(state)?;
        client
            .delete_folder(state.sidebar_or_default(), &state.identifier)
            .await?;
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::InvalidImportId(
                "expected a folder identifier".to_string(),
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
    async fn test_read_resolves_folder_from_sidebar() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/sidebars/catalog");
                then.status(200).json_body(json!({
                    "ok": true,
                    "sidebar": {"items": [
                        {"identifier": "infra", "title": "Infrastructure", "sidebarType": "folder"},
                        {"identifier": "microservices", "sidebarType": "page"}
                    ]}
                }));
            })
            .await;

        let state = FolderResource
            .read(&test_client(&server), json!({"identifier": "infra"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state["title"], "Infrastructure");
    }

    #[tokio::test]
    async fn test_read_missing_folder_drops_state() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/sidebars/catalog");
                then.status(200)
                    .json_body(json!({"ok": true, "sidebar": {"items": []}}));
            })
            .await;

        let result = FolderResource
            .read(&test_client(&server), json!({"identifier": "infra"}))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
