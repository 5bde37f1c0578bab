//! Resource lifecycle implementations.
//!
//! One [`Resource`] implementation per managed kind. Independent kinds map
//! straight onto their endpoints. Sub-resources (aggregation and calculation
//! properties, the permissions kinds) have no endpoint of their own and are
//! read-modify-write operations on their parent document, verified after
//! every write.

mod action;
mod aggregation;
mod blueprint;
mod calculation;
mod entity;
mod folder;
mod integration;
mod page;
mod permissions;
mod scorecard;
mod secret;
mod team;
mod webhook;

pub use action::ActionResource;
pub use aggregation::AggregationPropertyResource;
pub use blueprint::BlueprintResource;
pub use calculation::CalculationPropertyResource;
pub use entity::EntityResource;
pub use folder::FolderResource;
pub use integration::IntegrationResource;
pub use page::PageResource;
pub use permissions::{
    ActionPermissionsResource, BlueprintPermissionsResource, PagePermissionsResource,
};
pub use scorecard::ScorecardResource;
pub use secret::OrganizationSecretResource;
pub use team::TeamResource;
pub use webhook::WebhookResource;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::PortClient;
use crate::error::ProviderError;
use crate::models::blueprint::Blueprint;
use crate::schema::{Diagnostic, Schema};
use crate::validation;

/// One managed resource kind.
///
/// States cross this boundary as `serde_json::Value`; each implementation
/// decodes into its typed declarative struct on entry and encodes on exit.
/// The orchestrator invokes methods of the *same* resource sequentially but
/// may run different resources concurrently, so implementations hold no
/// mutable state of their own.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The resource type name, e.g. `port_blueprint`.
    fn type_name(&self) -> &'static str;

    /// The schema describing the resource's attributes and plan rules.
    fn schema(&self) -> Schema;

    /// Validate a configuration before any network call.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Read current remote state. `Ok(None)` means the resource is gone and
    /// is dropped from orchestrator state.
    async fn read(
        &self,
        client: &PortClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError>;

    /// Create the resource from the planned state, returning the new state.
    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError>;

    /// Update the resource to the planned state, returning the new state.
    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        prior: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the resource.
    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError>;

    /// Parse an import ID into a minimal state; the next read fills in the
    /// rest.
    fn import(&self, id: &str) -> Result<Value, ProviderError>;
}

pub(crate) fn decode_state<T: DeserializeOwned>(value: Value) -> Result<T, ProviderError> {
    Ok(serde_json::from_value(value)?)
}

pub(crate) fn encode_state<T: Serialize>(state: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(state)?)
}

/// Refuse to touch a beta-gated resource unless the gate env var is set.
pub(crate) fn ensure_beta_enabled(type_name: &str) -> Result<(), ProviderError> {
    if crate::config::beta_features_enabled() {
        Ok(())
    } else {
        Err(ProviderError::BetaGated(format!(
            "{type_name} is a beta resource; set {}=true to manage it",
            crate::config::ENV_BETA_FEATURES
        )))
    }
}

/// Split a `parent:child` composite import ID.
pub(crate) fn composite_id(id: &str, expected: &str) -> Result<(String, String), ProviderError> {
    match id.split_once(':') {
        Some((parent, child)) if !parent.is_empty() && !child.is_empty() => {
            Ok((parent.to_string(), child.to_string()))
        },
        _ => Err(ProviderError::InvalidImportId(format!(
            "'{id}' does not match the expected form {expected}"
        ))),
    }
}

/// Write a blueprint document back and return a fresh read of it.
///
/// Used by the sub-resources that mutate a map inside the blueprint. A PUT
/// response echoes the request, so post-write verification always inspects a
/// follow-up read of the parent document; the returned document is what the
/// callers verify against.
pub(crate) async fn write_blueprint(
    client: &PortClient,
    blueprint: &Blueprint,
) -> Result<Blueprint, ProviderError> {
    client
        .update_blueprint(&blueprint.identifier, blueprint)
        .await?;
    let (read_back, _status) = client.get_blueprint(&blueprint.identifier).await?;
    read_back.ok_or_else(|| {
        ProviderError::PostCondition(format!(
            "blueprint {} missing after write",
            blueprint.identifier
        ))
    })
}
