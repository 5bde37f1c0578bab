//! Entity models: instances of a blueprint with typed property values and
//! relation links.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Field;

/// Declarative entity state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntityState {
    /// User-assigned identifier; the server generates one when unset.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub identifier: Field<String>,
    /// Identifier of the owning blueprint.
    pub blueprint: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    /// Action run to correlate the change with (write-only).
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub run_id: Field<String>,
    /// Create referenced entities that do not exist yet (write-only).
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub create_missing_related_entities: Field<bool>,
    /// Delete dependent entities on destroy (write-only).
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub delete_dependents: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub teams: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<EntityPropertiesState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<EntityRelationsState>,

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

/// Typed property values, one map per property type. Object properties carry
/// their value as an opaque JSON string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntityPropertiesState {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_props: BTreeMap<String, Field<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub number_props: BTreeMap<String, Field<f64>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub boolean_props: BTreeMap<String, Field<bool>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub object_props: BTreeMap<String, Field<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_props: Option<EntityArrayPropertiesState>,
}

impl EntityPropertiesState {
    /// Whether no property of any type has a value.
    pub fn is_empty(&self) -> bool {
        self.string_props.is_empty()
            && self.number_props.is_empty()
            && self.boolean_props.is_empty()
            && self.object_props.is_empty()
            && self.array_props.is_none()
    }
}

/// Array-typed property values, split by element type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntityArrayPropertiesState {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_items: BTreeMap<String, Field<Vec<String>>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub number_items: BTreeMap<String, Field<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub boolean_items: BTreeMap<String, Field<Vec<bool>>>,
    /// Object elements as opaque JSON strings.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub object_items: BTreeMap<String, Field<Vec<String>>>,
}

/// Relation links: single targets and many-targets, keyed by relation name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntityRelationsState {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub single_relations: BTreeMap<String, Field<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub many_relations: BTreeMap<String, Field<Vec<String>>>,
}

impl EntityRelationsState {
    /// Whether no relation link is declared.
    pub fn is_empty(&self) -> bool {
        self.single_relations.is_empty() && self.many_relations.is_empty()
    }
}

/// The entity document as the API reads and writes it. Property and relation
/// values are free-form JSON on the wire; the translation layer reconciles
/// them with the typed maps above.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Body for `POST v1/entities/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub combinator: String,
    pub rules: Vec<serde_json::Value>,
}
