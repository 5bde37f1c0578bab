//! The provider surface.
//!
//! [`ProviderService`] is the protocol-facing trait an orchestrator drives:
//! schema, metadata, configure, plan and the resource CRUD/import calls.
//! [`PortProvider`] implements it by dispatching on the resource type name to
//! the registered [`Resource`] implementations, sharing one authenticated
//! [`PortClient`] across all of them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::PortClient;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::planmod;
use crate::resources::{
    ActionPermissionsResource, ActionResource, AggregationPropertyResource,
    BlueprintPermissionsResource, BlueprintResource, CalculationPropertyResource, EntityResource,
    FolderResource, IntegrationResource, OrganizationSecretResource, PagePermissionsResource,
    PageResource, Resource, ScorecardResource, TeamResource, WebhookResource,
};
use crate::schema::{Attribute, Diagnostic, ProviderSchema, Schema};
use crate::types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};

/// The high-level provider protocol.
///
/// Implementations are driven by an orchestrator: `schema` and `metadata`
/// are served statically, `configure` happens once before any resource
/// operation, and the remaining calls dispatch on a resource type name.
#[async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// The provider's full schema: provider config plus all resource types.
    fn schema(&self) -> ProviderSchema;

    /// Provider metadata, derived from the schema by default.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        let mut resources: Vec<String> = schema.resources.keys().cloned().collect();
        resources.sort();
        let mut data_sources: Vec<String> = schema.data_sources.keys().cloned().collect();
        data_sources.sort();
        ProviderMetadata {
            resources,
            data_sources,
        }
    }

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Validate a resource configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Upgrade resource state from an older schema version.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let _ = (resource_type, version);
        Ok(state)
    }

    /// Plan changes for a resource.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource.
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Read the current state of a resource. A `Value::Null` result means the
    /// resource is gone and should be dropped from state.
    async fn read(&self, resource_type: &str, current_state: Value)
        -> Result<Value, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value)
        -> Result<(), ProviderError>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let _ = id;
        Err(ProviderError::UnknownResource(format!(
            "import not supported for resource type {resource_type}"
        )))
    }
}

/// The Port provider: fifteen resource kinds behind one shared client.
pub struct PortProvider {
    resources: HashMap<&'static str, Arc<dyn Resource>>,
    client: RwLock<Option<Arc<PortClient>>>,
}

impl PortProvider {
    /// Create a provider with every resource kind registered.
    pub fn new() -> Self {
        let mut resources: HashMap<&'static str, Arc<dyn Resource>> = HashMap::new();
        for resource in [
            Arc::new(BlueprintResource) as Arc<dyn Resource>,
            Arc::new(EntityResource),
            Arc::new(ActionResource),
            Arc::new(ActionPermissionsResource),
            Arc::new(ScorecardResource),
            Arc::new(WebhookResource),
            Arc::new(PageResource),
            Arc::new(FolderResource),
            Arc::new(PagePermissionsResource),
            Arc::new(BlueprintPermissionsResource),
            Arc::new(TeamResource),
            Arc::new(IntegrationResource),
            Arc::new(OrganizationSecretResource),
            Arc::new(AggregationPropertyResource),
            Arc::new(CalculationPropertyResource),
        ] {
            resources.insert(resource.type_name(), resource);
        }
        Self {
            resources,
            client: RwLock::new(None),
        }
    }

    /// Look up a registered resource by type name.
    fn resource(&self, resource_type: &str) -> Result<&Arc<dyn Resource>, ProviderError> {
        self.resources.get(resource_type).ok_or_else(|| {
            ProviderError::UnknownResource(format!("unknown resource type {resource_type}"))
        })
    }

    /// The configured client; an error before `configure` has run.
    async fn client(&self) -> Result<Arc<PortClient>, ProviderError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or_else(|| {
                ProviderError::Configuration("the provider is not configured".to_string())
            })
    }

    /// Install a pre-built client, bypassing `configure`. Test hook.
    pub async fn set_client(&self, client: PortClient) {
        *self.client.write().await = Some(Arc::new(client));
    }

    fn provider_config_schema() -> Schema {
        Schema::v0()
            .with_attribute("client_id", Attribute::optional_string())
            .with_attribute("secret", Attribute::optional_string().sensitive())
            .with_attribute("token", Attribute::optional_string().sensitive())
            .with_attribute("base_url", Attribute::optional_string())
    }
}

impl Default for PortProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderService for PortProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(Self::provider_config_schema());
        for resource in self.resources.values() {
            schema = schema.with_resource(resource.type_name(), resource.schema());
        }
        schema
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let config = ProviderConfig::from_value(config)?;
        match config.validate() {
            Ok(()) => Ok(vec![]),
            Err(e) => Ok(vec![Diagnostic::error(e.to_string())]),
        }
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let config = ProviderConfig::from_value(config)?;
        if let Err(e) = config.validate() {
            return Ok(vec![Diagnostic::error(e.to_string())]);
        }

        let mut builder = PortClient::builder(config.base_url());
        if let Some(token) = &config.token {
            builder = builder.token(token.as_str());
        }
        let client = builder.build().map_err(ProviderError::Client)?;

        if config.token.is_none() {
            // validate() guarantees both halves are present here
            let (Some(client_id), Some(secret)) = (&config.client_id, &config.secret) else {
                return Ok(vec![Diagnostic::error("missing credentials")]);
            };
            if let Err(e) = client.authenticate(client_id, secret).await {
                return Ok(vec![
                    Diagnostic::error("authentication against the Port API failed")
                        .with_detail(e.to_string()),
                ]);
            }
        }

        info!(base_url = %client.base_url(), "provider configured");
        *self.client.write().await = Some(Arc::new(client));
        Ok(vec![])
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.resource(resource_type)?.validate(&config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        let schema = resource.schema();

        // Destroy plan
        if proposed_state.is_null() {
            let changes = match &prior_state {
                Some(Value::Object(map)) => map
                    .iter()
                    .map(|(k, v)| AttributeChange::removed(k, v.clone()))
                    .collect(),
                _ => Vec::new(),
            };
            return Ok(PlanResult::with_changes(Value::Null, changes, false));
        }

        let mut planned = proposed_state;
        for (name, attr) in &schema.block.attributes {
            if let Some(default) = &attr.default {
                planmod::default_for_unset(&mut planned, name, default.clone());
            }
        }

        let Some(prior) = prior_state.filter(|p| !p.is_null()) else {
            let changes = match &planned {
                Value::Object(map) => map
                    .iter()
                    .map(|(k, v)| AttributeChange::added(k, v.clone()))
                    .collect(),
                _ => Vec::new(),
            };
            return Ok(PlanResult::with_changes(planned, changes, false));
        };

        for (name, attr) in &schema.block.attributes {
            if attr.use_state_for_unknown {
                planmod::use_state_for_unknown(&mut planned, &prior, name);
            }
            if attr.semantic_json {
                planmod::normalize_semantic_json(&mut planned, &prior, name);
            }
        }

        let changes = diff_states(&prior, &planned);
        let requires_replace = schema.block.attributes.iter().any(|(name, attr)| {
            attr.requires_replace
                && changes.iter().any(|c| c.path == *name)
        });

        if changes.is_empty() {
            debug!(resource_type, "plan found no changes");
            Ok(PlanResult::no_change(planned))
        } else {
            Ok(PlanResult::with_changes(planned, changes, requires_replace))
        }
    }

    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        self.resource(resource_type)?.create(&client, planned_state).await
    }

    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        let state = self
            .resource(resource_type)?
            .read(&client, current_state)
            .await?;
        Ok(state.unwrap_or(Value::Null))
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        self.resource(resource_type)?
            .update(&client, planned_state, prior_state)
            .await
    }

    async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let client = self.client().await?;
        self.resource(resource_type)?.delete(&client, current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let state = self.resource(resource_type)?.import(id)?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }
}

/// Top-level attribute diff between two state objects.
fn diff_states(prior: &Value, planned: &Value) -> Vec<AttributeChange> {
    let (Value::Object(prior_map), Value::Object(planned_map)) = (prior, planned) else {
        return Vec::new();
    };
    let mut changes = Vec::new();
    for (key, planned_value) in planned_map {
        match prior_map.get(key) {
            None => changes.push(AttributeChange::added(key, planned_value.clone())),
            Some(prior_value) if prior_value != planned_value => changes.push(
                AttributeChange::modified(key, prior_value.clone(), planned_value.clone()),
            ),
            Some(_) => {},
        }
    }
    for (key, prior_value) in prior_map {
        if !planned_map.contains_key(key) {
            changes.push(AttributeChange::removed(key, prior_value.clone()));
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_lists_all_resource_types() {
        let provider = PortProvider::new();
        let metadata = provider.metadata();
        assert_eq!(metadata.resources.len(), 15);
        for expected in [
            "port_action",
            "port_action_permissions",
            "port_aggregation_property",
            "port_blueprint",
            "port_blueprint_permissions",
            "port_calculation_property",
            "port_entity",
            "port_folder",
            "port_integration",
            "port_organization_secret",
            "port_page",
            "port_page_permissions",
            "port_scorecard",
            "port_team",
            "port_webhook",
        ] {
            assert!(
                metadata.resources.contains(&expected.to_string()),
                "missing {expected}"
            );
        }
        assert!(metadata.data_sources.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = PortProvider::new();
        let err = provider
            .import_resource("port_unknown", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_operations_before_configure_fail() {
        let provider = PortProvider::new();
        let err = provider
            .read("port_blueprint", json!({"identifier": "svc"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_configure_rejects_missing_credentials() {
        let provider = PortProvider::new();
        if std::env::var(crate::config::ENV_CLIENT_ID).is_ok() {
            return;
        }
        let diags = provider.configure(json!({})).await.unwrap();
        assert!(!diags.is_empty());
    }

    #[tokio::test]
    async fn test_plan_carries_computed_timestamps_forward() {
        let provider = PortProvider::new();
        let prior = json!({
            "identifier": "svc",
            "title": "Service",
            "created_at": "2024-01-01T00:00:00Z",
            "created_by": "me",
            "updated_at": "2024-06-01T00:00:00Z",
            "updated_by": "me"
        });
        let proposed = json!({"identifier": "svc", "title": "Renamed"});

        let plan = provider
            .plan("port_blueprint", Some(prior), proposed, Value::Null)
            .await
            .unwrap();

        assert_eq!(plan.planned_state["created_at"], "2024-01-01T00:00:00Z");
        assert!(plan.changes.iter().any(|c| c.path == "title"));
        assert!(!plan.requires_replace);
    }

    #[tokio::test]
    async fn test_plan_replaces_on_secret_rename() {
        let provider = PortProvider::new();
        let plan = provider
            .plan(
                "port_organization_secret",
                Some(json!({"secret_name": "old", "secret_value": "v"})),
                json!({"secret_name": "new", "secret_value": "v"}),
                Value::Null,
            )
            .await
            .unwrap();
        assert!(plan.requires_replace);
    }

    #[tokio::test]
    async fn test_plan_ignores_json_reserialisation() {
        let provider = PortProvider::new();
        let prior = json!({
            "installation_id": "github-main",
            "config": r#"{"resources":[],"enableMergeEntity":true}"#
        });
        let proposed = json!({
            "installation_id": "github-main",
            "config": r#"{ "enableMergeEntity": true, "resources": [] }"#
        });

        let plan = provider
            .plan("port_integration", Some(prior), proposed, Value::Null)
            .await
            .unwrap();
        assert!(plan.changes.is_empty());
    }

    #[tokio::test]
    async fn test_destroy_plan() {
        let provider = PortProvider::new();
        let plan = provider
            .plan(
                "port_team",
                Some(json!({"name": "platform"})),
                Value::Null,
                Value::Null,
            )
            .await
            .unwrap();
        assert!(plan.planned_state.is_null());
        assert!(plan.changes.iter().any(|c| c.path == "name"));
    }

    #[tokio::test]
    async fn test_validate_dispatches_to_resource() {
        let provider = PortProvider::new();
        let diags = provider
            .validate_resource_config(
                "port_blueprint_permissions",
                json!({
                    "blueprint_identifier": "svc",
                    "entities": {"update_properties": {"$team": {"roles": ["Admin"]}}}
                }),
            )
            .await
            .unwrap();
        assert!(diags.iter().any(|d| d.summary.contains("Reserved key")));
    }
}
