//! Blueprint models: the schema definition for a class of portal entities.
//!
//! Blueprints are the largest documents in the API. They also host the
//! sub-resources (aggregation and calculation properties) that have no
//! endpoint of their own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::aggregation::AggregationPropertyBody;
use crate::models::calculation::CalculationPropertyBody;
use crate::types::Field;

// ---------------------------------------------------------------------------
// Declarative side
// ---------------------------------------------------------------------------

/// Declarative blueprint state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlueprintState {
    /// Stable user-assigned identifier.
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    /// Create a catalog page alongside the blueprint (create-time only).
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub create_catalog_page: Field<bool>,
    /// Delete all entities together with the blueprint on destroy (local
    /// flag, never sent to the server).
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub force_delete_entities: Field<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BlueprintPropertiesState>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mirror_properties: BTreeMap<String, MirrorPropertyState>,
    /// Calculation properties managed inline on the blueprint. The same
    /// sub-documents can instead be managed standalone via the
    /// `port_calculation_property` resource.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub calculation_properties: BTreeMap<String, InlineCalculationState>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, RelationState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<OwnershipState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog_destination: Option<ChangelogDestinationState>,

    // Server-computed
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_at: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_by: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated_at: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated_by: Field<String>,
}

/// Typed property maps, one per property type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlueprintPropertiesState {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_props: BTreeMap<String, StringPropState>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub number_props: BTreeMap<String, NumberPropState>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub boolean_props: BTreeMap<String, BooleanPropState>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub array_props: BTreeMap<String, ArrayPropState>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub object_props: BTreeMap<String, ObjectPropState>,
}

impl BlueprintPropertiesState {
    /// Whether no property of any type is declared.
    pub fn is_empty(&self) -> bool {
        self.string_props.is_empty()
            && self.number_props.is_empty()
            && self.boolean_props.is_empty()
            && self.array_props.is_empty()
            && self.object_props.is_empty()
    }
}

/// A string-typed blueprint property.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StringPropState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    /// String format (`url`, `email`, `date-time`, `user`, `team`, ...).
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub format: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub default: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub pattern: Field<String>,
    #[serde(default, rename = "enum", skip_serializing_if = "Field::is_unset")]
    pub enums: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub enum_colors: Field<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub min_length: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub max_length: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub required: Field<bool>,
}

/// A number-typed blueprint property.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NumberPropState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub default: Field<f64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub minimum: Field<f64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub maximum: Field<f64>,
    #[serde(default, rename = "enum", skip_serializing_if = "Field::is_unset")]
    pub enums: Field<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub enum_colors: Field<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub required: Field<bool>,
}

/// A boolean-typed blueprint property.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BooleanPropState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub default: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub required: Field<bool>,
}

/// An array-typed blueprint property. Exactly one `*_items` block describes
/// the element type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArrayPropState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub min_items: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub max_items: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub required: Field<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_items: Option<StringItemsState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_items: Option<NumberItemsState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_items: Option<BooleanItemsState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_items: Option<ObjectItemsState>,
}

/// String array element description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StringItemsState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub format: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub default: Field<Vec<String>>,
}

/// Number array element description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NumberItemsState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub default: Field<Vec<f64>>,
}

/// Boolean array element description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BooleanItemsState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub default: Field<Vec<bool>>,
}

/// Object array element description; defaults are opaque JSON strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ObjectItemsState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub default: Field<Vec<String>>,
}

/// An object-typed blueprint property; the default is an opaque JSON string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ObjectPropState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub default: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub spec: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub required: Field<bool>,
}

/// A property mirrored from a related entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MirrorPropertyState {
    /// Path through relations to the mirrored property.
    pub path: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
}

/// A calculation property declared inline on the blueprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InlineCalculationState {
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

/// A relation to another blueprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RelationState {
    /// Identifier of the target blueprint.
    pub target: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub required: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub many: Field<bool>,
}

/// Ownership configuration for entities of this blueprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OwnershipState {
    /// `Direct` or `Inherited`.
    #[serde(rename = "type")]
    pub ownership_type: String,
    /// Relation path for inherited ownership.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub path: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
}

/// Where entity change events are delivered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangelogDestinationState {
    /// `WEBHOOK` or `KAFKA`.
    #[serde(rename = "type")]
    pub destination_type: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub url: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub agent: Field<bool>,
}

// ---------------------------------------------------------------------------
// Wire side
// ---------------------------------------------------------------------------

/// The blueprint document as the API reads and writes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: BlueprintSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_properties: Option<BTreeMap<String, MirrorPropertyBody>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_properties: Option<BTreeMap<String, CalculationPropertyBody>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_properties: Option<BTreeMap<String, AggregationPropertyBody>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<BTreeMap<String, RelationBody>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<OwnershipBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog_destination: Option<ChangelogDestinationBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// The `schema` sub-document: property map plus required list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlueprintSchema {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyBody>,
    #[serde(default)]
    pub required: Vec<String>,
}

/// One property definition on the wire; a single shape covers all five
/// property types.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyBody {
    #[serde(rename = "type")]
    pub prop_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enums: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_colors: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
}

/// Wire form of a mirror property.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MirrorPropertyBody {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Wire form of a relation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RelationBody {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub many: Option<bool>,
}

/// Wire form of the ownership configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OwnershipBody {
    #[serde(rename = "type")]
    pub ownership_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Wire form of the changelog destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangelogDestinationBody {
    #[serde(rename = "type")]
    pub destination_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<bool>,
}

/// A migration record returned by cascade blueprint deletion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Migration {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<String>,
}

impl Migration {
    /// Whether the migration has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "COMPLETE" | "FAILURE" | "CANCELLED")
    }

    /// Whether the migration finished successfully.
    pub fn is_complete(&self) -> bool {
        self.status == "COMPLETE"
    }
}
