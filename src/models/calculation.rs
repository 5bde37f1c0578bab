//! Calculation property models.
//!
//! Like aggregation properties, calculation properties are sub-documents of a
//! blueprint (`calculationProperties`). The same wire body backs both the
//! inline blueprint form and the standalone resource.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Field;

/// Declarative state for a standalone calculation property.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CalculationPropertyState {
    /// Blueprint that hosts the calculation property.
    pub blueprint_identifier: String,
    /// Key of the property inside the parent's `calculationProperties` map.
    pub calculation_identifier: String,
    /// The jq calculation expression.
    pub calculation: String,
    /// Result type (`string`, `number`, `boolean`, `object`, `array`).
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub format: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub colorized: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub colors: Field<BTreeMap<String, String>>,
}

/// Wire form of one calculation property inside the blueprint document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CalculationPropertyBody {
    pub calculation: String,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colorized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_omits_unset_fields() {
        let body = CalculationPropertyBody {
            calculation: ".props.cpu * 2".into(),
            property_type: "number".into(),
            ..Default::default()
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v, json!({"calculation": ".props.cpu * 2", "type": "number"}));
    }

    #[test]
    fn test_state_rename_type() {
        let state: CalculationPropertyState = serde_json::from_value(json!({
            "blueprint_identifier": "svc",
            "calculation_identifier": "doubled",
            "calculation": ".props.cpu * 2",
            "type": "number"
        }))
        .unwrap();
        assert_eq!(state.property_type, "number");
    }
}
