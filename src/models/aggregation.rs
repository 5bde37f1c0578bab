//! Aggregation property models.
//!
//! Aggregation properties live inside the blueprint document under
//! `aggregationProperties` and have no endpoint of their own. The declarative
//! model exposes four mutually exclusive method blocks; the wire form carries
//! a uniform `calculationSpec` map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Field;

/// Declarative state for a standalone aggregation property.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregationPropertyState {
    /// Blueprint that hosts the aggregation property.
    pub blueprint_identifier: String,
    /// Key of the property inside the parent's `aggregationProperties` map.
    pub aggregation_identifier: String,
    /// Identifier of the blueprint whose entities are aggregated.
    pub target_blueprint_identifier: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    /// Search query narrowing the aggregated entity set, as a JSON string.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub query: Field<String>,
    /// Exactly one of the four method blocks must be set.
    #[serde(default)]
    pub method: AggregationMethodState,
}

/// The four mutually exclusive aggregation methods.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregationMethodState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_entities: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_entities: Option<AverageEntitiesState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_by_property: Option<AverageByPropertyState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_by_property: Option<AggregateByPropertyState>,
}

impl AggregationMethodState {
    /// Number of variant blocks that are set.
    pub fn variant_count(&self) -> usize {
        usize::from(self.count_entities.is_some())
            + usize::from(self.average_entities.is_some())
            + usize::from(self.average_by_property.is_some())
            + usize::from(self.aggregate_by_property.is_some())
    }
}

/// Average the number of entities per time window.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AverageEntitiesState {
    /// Time window: `hour`, `day`, `week`, `month` or `total`. Defaults to `day`.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub average_of: Field<String>,
    /// Timestamp property to bucket by. Defaults to `$createdAt`.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub measure_time_by: Field<String>,
}

/// Average a numeric property over a time window.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AverageByPropertyState {
    /// Time window: `hour`, `day`, `week`, `month` or `total`.
    pub average_of: String,
    /// Timestamp property to bucket by.
    pub measure_time_by: String,
    /// The numeric property being averaged.
    pub property: String,
}

/// Apply `func` over a numeric property of the aggregated entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregateByPropertyState {
    /// One of `sum`, `min`, `max`, `median`.
    pub func: String,
    /// The numeric property being aggregated.
    pub property: String,
}

/// Wire form of one aggregation property inside the blueprint document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregationPropertyBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target: String,
    /// Uniform method description: `func`, `calculationBy` and the
    /// variant-specific keys (`averageOf`, `measureTimeBy`, `property`).
    pub calculation_spec: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variant_count() {
        let mut method = AggregationMethodState::default();
        assert_eq!(method.variant_count(), 0);
        method.count_entities = Some(true);
        assert_eq!(method.variant_count(), 1);
        method.average_entities = Some(AverageEntitiesState::default());
        assert_eq!(method.variant_count(), 2);
    }

    #[test]
    fn test_body_serialization() {
        let mut spec = BTreeMap::new();
        spec.insert("func".to_string(), "count".to_string());
        spec.insert("calculationBy".to_string(), "entities".to_string());
        let body = AggregationPropertyBody {
            target: "service".into(),
            calculation_spec: spec,
            ..Default::default()
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(
            v,
            json!({
                "target": "service",
                "calculationSpec": {"calculationBy": "entities", "func": "count"}
            })
        );
    }
}
