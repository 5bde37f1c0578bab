//! Aggregation property translation: method variants to the uniform
//! `calculationSpec` map and back.

use std::collections::BTreeMap;

use crate::error::ProviderError;
use crate::models::aggregation::{
    AggregateByPropertyState, AggregationMethodState, AggregationPropertyBody,
    AggregationPropertyState, AverageByPropertyState, AverageEntitiesState,
};
use crate::types::Field;

use super::{parse_json_string, refresh_field, to_json_string};

/// Default time window for `average_entities`.
pub const DEFAULT_AVERAGE_OF: &str = "day";
/// Default timestamp property for `average_entities`.
pub const DEFAULT_MEASURE_TIME_BY: &str = "$createdAt";

/// Build the wire body for one aggregation property.
pub fn aggregation_property_to_body(
    state: &AggregationPropertyState,
) -> Result<AggregationPropertyBody, ProviderError> {
    let calculation_spec = calculation_spec(&state.method)?;
    let query = state
        .query
        .to_body()
        .map(|raw| parse_json_string(raw, "aggregation query"))
        .transpose()?;
    Ok(AggregationPropertyBody {
        title: state.title.to_body().cloned(),
        icon: state.icon.to_body().cloned(),
        description: state.description.to_body().cloned(),
        target: state.target_blueprint_identifier.clone(),
        calculation_spec,
        query,
    })
}

/// Fold a freshly read aggregation body back into declarative state.
pub fn refresh_aggregation_property_state(
    state: &mut AggregationPropertyState,
    wire: &AggregationPropertyBody,
    escape_html: bool,
) -> Result<(), ProviderError> {
    refresh_field(&mut state.title, wire.title.as_ref());
    refresh_field(&mut state.icon, wire.icon.as_ref());
    refresh_field(&mut state.description, wire.description.as_ref());
    state.target_blueprint_identifier = wire.target.clone();
    let query = wire
        .query
        .as_ref()
        .map(|v| to_json_string(v, escape_html))
        .transpose()?;
    refresh_field(&mut state.query, query.as_ref());
    state.method = method_from_spec(&wire.calculation_spec)?;
    Ok(())
}

/// Derive the uniform `calculationSpec` map from the chosen method variant.
/// Exactly one variant must be set.
pub fn calculation_spec(
    method: &AggregationMethodState,
) -> Result<BTreeMap<String, String>, ProviderError> {
    if method.variant_count() != 1 {
        return Err(ProviderError::Validation(
            "exactly one aggregation method must be set".to_string(),
        ));
    }

    let mut spec = BTreeMap::new();
    if method.count_entities == Some(true) {
        spec.insert("func".to_string(), "count".to_string());
        spec.insert("calculationBy".to_string(), "entities".to_string());
    } else if let Some(avg) = &method.average_entities {
        spec.insert("func".to_string(), "average".to_string());
        spec.insert("calculationBy".to_string(), "entities".to_string());
        spec.insert(
            "averageOf".to_string(),
            avg.average_of
                .as_known()
                .cloned()
                .unwrap_or_else(|| DEFAULT_AVERAGE_OF.to_string()),
        );
        spec.insert(
            "measureTimeBy".to_string(),
            avg.measure_time_by
                .as_known()
                .cloned()
                .unwrap_or_else(|| DEFAULT_MEASURE_TIME_BY.to_string()),
        );
    } else if let Some(avg) = &method.average_by_property {
        spec.insert("func".to_string(), "average".to_string());
        spec.insert("calculationBy".to_string(), "property".to_string());
        spec.insert("property".to_string(), avg.property.clone());
        spec.insert("averageOf".to_string(), avg.average_of.clone());
        spec.insert("measureTimeBy".to_string(), avg.measure_time_by.clone());
    } else if let Some(agg) = &method.aggregate_by_property {
        spec.insert("func".to_string(), agg.func.clone());
        spec.insert("calculationBy".to_string(), "property".to_string());
        spec.insert("property".to_string(), agg.property.clone());
    }
    Ok(spec)
}

/// Rebuild the declarative method variant from a `calculationSpec` map.
pub fn method_from_spec(
    spec: &BTreeMap<String, String>,
) -> Result<AggregationMethodState, ProviderError> {
    let func = spec.get("func").map(String::as_str).unwrap_or_default();
    let by = spec
        .get("calculationBy")
        .map(String::as_str)
        .unwrap_or_default();

    let mut method = AggregationMethodState::default();
    match (func, by) {
        ("count", "entities") => method.count_entities = Some(true),
        ("average", "entities") => {
            method.average_entities = Some(AverageEntitiesState {
                average_of: Field::from_server(spec.get("averageOf").cloned()),
                measure_time_by: Field::from_server(spec.get("measureTimeBy").cloned()),
            });
        },
        ("average", "property") => {
            method.average_by_property = Some(AverageByPropertyState {
                average_of: spec.get("averageOf").cloned().unwrap_or_default(),
                measure_time_by: spec.get("measureTimeBy").cloned().unwrap_or_default(),
                property: spec.get("property").cloned().unwrap_or_default(),
            });
        },
        (func @ ("sum" | "min" | "max" | "median"), "property") => {
            method.aggregate_by_property = Some(AggregateByPropertyState {
                func: func.to_string(),
                property: spec.get("property").cloned().unwrap_or_default(),
            });
        },
        (func, by) => {
            return Err(ProviderError::Validation(format!(
                "unrecognised calculation spec: func={func} calculationBy={by}"
            )))
        },
    }
    Ok(method)
}
