//! The `port_calculation_property` resource.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::PortClient;
use crate::error::ProviderError;
use crate::models::blueprint::Blueprint;
use crate::models::calculation::CalculationPropertyState;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::translate::calculation::{
    calculation_property_to_body, refresh_calculation_property_state,
};

use super::{aggregation::require_blueprint, composite_id, decode_state, encode_state,
    write_blueprint, Resource};

/// A single calculation property managed standalone, by read-modify-write of
/// its parent blueprint document. Mixing this with an inline
/// `calculation_properties` map on the same blueprint is unsupported; the two
/// would overwrite each other.
#[derive(Debug, Default)]
pub struct CalculationPropertyResource;

#[async_trait]
impl Resource for CalculationPropertyResource {
    fn type_name(&self) -> &'static str {
        "port_calculation_property"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "blueprint_identifier",
                Attribute::required_string().with_requires_replace(),
            )
            .with_attribute(
                "calculation_identifier",
                Attribute::required_string().with_requires_replace(),
            )
            .with_attribute("calculation", Attribute::required_string())
            .with_attribute(
                "type",
                Attribute::required_string().with_enum_values([
                    "string", "number", "boolean", "object", "array",
                ]),
            )
            .with_attribute("title", Attribute::optional_string())
            .with_attribute("icon", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("format", Attribute::optional_string())
            .with_attribute("colorized", Attribute::optional_bool())
            .with_attribute(
                "colors",
                Attribute::new(
                    AttributeType::map(AttributeType::String),
                    crate::schema::AttributeFlags::optional(),
                ),
            )
    }

    async fn read(
        &self,
        client: &PortClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let mut state: CalculationPropertyState = decode_state(state)?;
        let (blueprint, _status) = client.get_blueprint(&state.blueprint_identifier).await?;
        let Some(blueprint) = blueprint else {
            return Ok(None);
        };
        let Some(body) = blueprint
            .calculation_properties
            .as_ref()
            .and_then(|map| map.get(&state.calculation_identifier))
        else {
            return Ok(None);
        };
        refresh_calculation_property_state(&mut state, body);
        Ok(Some(encode_state(&state)?))
    }

    async fn create(&self, client: &PortClient, planned: Value) -> Result<Value, ProviderError> {
        let mut state: CalculationPropertyState = decode_state(planned)?;
        let mut blueprint = require_blueprint(client, &state.blueprint_identifier).await?;
        let map = blueprint.calculation_properties.get_or_insert_with(Default::default);
        if map.contains_key(&state.calculation_identifier) {
            return Err(ProviderError::AlreadyExists(format!(
                "calculation property {} already exists on blueprint {}",
                state.calculation_identifier, state.blueprint_identifier
            )));
        }
        map.insert(
            state.calculation_identifier.clone(),
            calculation_property_to_body(&state)?,
        );
        self.write_and_refresh(client, &blueprint, &mut state).await?;
        Ok(encode_state(&state)?)
    }

    async fn update(
        &self,
        client: &PortClient,
        planned: Value,
        _prior: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: CalculationPropertyState = decode_state(planned)?;
        let mut blueprint = require_blueprint(client, &state.blueprint_identifier).await?;
        blueprint
            .calculation_properties
            .get_or_insert_with(Default::default)
            .insert(
                state.calculation_identifier.clone(),
                calculation_property_to_body(&state)?,
            );
        self.write_and_refresh(client, &blueprint, &mut state).await?;
        Ok(encode_state(&state)?)
    }

    async fn delete(&self, client: &PortClient, state: Value) -> Result<(), ProviderError> {
        let state: CalculationPropertyState = decode_state(state)?;
        let (blueprint, _status) = client.get_blueprint(&state.blueprint_identifier).await?;
        let Some(mut blueprint) = blueprint else {
            return Ok(());
        };
        let removed = blueprint
            .calculation_properties
            .as_mut()
            .and_then(|map| map.remove(&state.calculation_identifier));
        if removed.is_none() {
            return Ok(());
        }
        let written = write_blueprint(client, &blueprint).await?;
        let still_present = written
            .calculation_properties
            .as_ref()
            .is_some_and(|map| map.contains_key(&state.calculation_identifier));
        if still_present {
            return Err(ProviderError::PostCondition(format!(
                "calculation property {} still present on blueprint {} after delete",
                state.calculation_identifier, state.blueprint_identifier
            )));
        }
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let (blueprint, calculation) = composite_id(id, "blueprint_id:calculation_id")?;
        Ok(json!({
            "blueprint_identifier": blueprint,
            "calculation_identifier": calculation,
            "calculation": "",
            "type": ""
        }))
    }
}

impl CalculationPropertyResource {
    async fn write_and_refresh(
        &self,
        client: &PortClient,
        blueprint: &Blueprint,
        state: &mut CalculationPropertyState,
    ) -> Result<(), ProviderError> {
        let written = write_blueprint(client, blueprint).await?;
        let body = written
            .calculation_properties
            .as_ref()
            .and_then(|map| map.get(&state.calculation_identifier))
            .ok_or_else(|| {
                ProviderError::PostCondition(format!(
                    "calculation property {} missing from blueprint {} after write",
                    state.calculation_identifier, state.blueprint_identifier
                ))
            })?;
        refresh_calculation_property_state(state, body);
        Ok(())
    }
}
