//! Core value and plan types shared across the provider.
//!
//! The declarative side of every resource is built from [`Field`] containers
//! that mirror the orchestrator's value model: a field is either *unset*
//! (leave whatever the server has), explicitly *null* (clear the server
//! field), or a *known* value. Preserving the unset/null distinction is what
//! lets the translation layer avoid clobbering server state.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A declarative field value: unset, explicitly null, or known.
///
/// With `#[serde(default, skip_serializing_if = "Field::is_unset")]` on the
/// containing struct field, a missing JSON key deserializes to `Unset` and an
/// explicit `null` deserializes to `Null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// The user did not set the field; the server value is left untouched.
    Unset,
    /// The user explicitly cleared the field.
    Null,
    /// The user set the field to a value.
    Known(T),
}

impl<T> Field<T> {
    /// Whether the field was left unset.
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Whether the field was explicitly cleared.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the field holds a value.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Borrow the known value, if any.
    pub fn as_known(&self) -> Option<&T> {
        match self {
            Self::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Consume the field, returning the known value if any.
    pub fn into_known(self) -> Option<T> {
        match self {
            Self::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Map the known value, preserving unset/null.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Field<U> {
        match self {
            Self::Known(v) => Field::Known(f(v)),
            Self::Null => Field::Null,
            Self::Unset => Field::Unset,
        }
    }

    /// Build a field from a server-side optional: present becomes known,
    /// absent stays unset.
    pub fn from_server(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Known(v),
            None => Self::Unset,
        }
    }

    /// The wire representation of this field: known values serialize, null
    /// clears, unset is omitted entirely (callers skip it).
    pub fn to_body(&self) -> Option<&T> {
        self.as_known()
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Known(v),
            None => Self::Null,
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(v) => v.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Self::Known(v),
            None => Self::Null,
        })
    }
}

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<serde_json::Value>,
    /// The value after the change (None if deleting).
    pub after: Option<serde_json::Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(
        path: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(
        path: impl Into<String>,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: serde_json::Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: serde_json::Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: serde_json::Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported (minimal) state; the next read populates the rest.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata returned by the metadata call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
    /// List of data source type names.
    pub data_sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        title: Field<String>,
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        count: Field<i64>,
    }

    #[test]
    fn test_missing_key_is_unset() {
        let s: Sample = serde_json::from_value(json!({})).unwrap();
        assert!(s.title.is_unset());
        assert!(s.count.is_unset());
    }

    #[test]
    fn test_explicit_null_is_null() {
        let s: Sample = serde_json::from_value(json!({"title": null})).unwrap();
        assert!(s.title.is_null());
        assert!(s.count.is_unset());
    }

    #[test]
    fn test_known_value_round_trips() {
        let s: Sample = serde_json::from_value(json!({"title": "Service", "count": 3})).unwrap();
        assert_eq!(s.title.as_known(), Some(&"Service".to_string()));
        assert_eq!(s.count.as_known(), Some(&3));

        let back = serde_json::to_value(&s).unwrap();
        assert_eq!(back, json!({"title": "Service", "count": 3}));
    }

    #[test]
    fn test_unset_is_skipped_null_is_emitted() {
        let s = Sample {
            title: Field::Null,
            count: Field::Unset,
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v, json!({"title": null}));
    }

    #[test]
    fn test_from_server() {
        assert_eq!(Field::from_server(Some(1)), Field::Known(1));
        assert_eq!(Field::<i64>::from_server(None), Field::Unset);
    }

    #[test]
    fn test_map_preserves_shape() {
        assert_eq!(
            Field::Known("a".to_string()).map(|s| s.len()),
            Field::Known(1)
        );
        assert_eq!(Field::<String>::Null.map(|s| s.len()), Field::Null);
        assert_eq!(Field::<String>::Unset.map(|s| s.len()), Field::Unset);
    }

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("title", json!("test"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("test")));

        let removed = AttributeChange::removed("title", json!("old"));
        assert_eq!(removed.before, Some(json!("old")));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("count", json!(1), json!(2));
        assert_eq!(modified.before, Some(json!(1)));
        assert_eq!(modified.after, Some(json!(2)));
    }

    #[test]
    fn test_plan_result() {
        let no_change = PlanResult::no_change(json!({"identifier": "svc"}));
        assert!(no_change.changes.is_empty());
        assert!(!no_change.requires_replace);

        let with_changes = PlanResult::with_changes(
            json!({"identifier": "svc", "title": "new"}),
            vec![AttributeChange::modified(
                "title",
                json!("old"),
                json!("new"),
            )],
            false,
        );
        assert_eq!(with_changes.changes.len(), 1);
    }

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new("port_blueprint", json!({"identifier": "svc"}));
        assert_eq!(imported.resource_type, "port_blueprint");
        assert_eq!(imported.state["identifier"], "svc");
    }
}
