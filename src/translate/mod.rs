//! Bidirectional translation between declarative state and wire documents.
//!
//! Each resource kind gets a mirror pair: `<kind>_to_body` builds the wire
//! document from the declarative state, and `refresh_<kind>_state` folds a
//! freshly read wire document back into the state. The pair must round-trip
//! every user-authored field, keep unset fields unset, and route
//! server-computed values into their computed slots only.

pub mod action;
pub mod aggregation;
pub mod blueprint;
pub mod calculation;
pub mod entity;
pub mod folder;
pub mod integration;
pub mod page;
pub mod permissions;
pub mod scorecard;
pub mod secret;
pub mod team;
pub mod webhook;

use crate::error::ProviderError;
use crate::types::Field;

/// Fold a server value into a user-authored field. Unset stays unset; a set
/// field (known or null) adopts the server's value, with an absent server
/// value becoming null.
pub(crate) fn refresh_field<T: Clone>(field: &mut Field<T>, server: Option<&T>) {
    if field.is_unset() {
        return;
    }
    *field = match server {
        Some(v) => Field::Known(v.clone()),
        None => Field::Null,
    };
}

/// Fold a server value into a computed field. Computed fields always adopt
/// the server value; absent becomes null so the orchestrator sees a settled
/// value after apply.
pub(crate) fn computed_field<T: Clone>(field: &mut Field<T>, server: Option<&T>) {
    *field = match server {
        Some(v) => Field::Known(v.clone()),
        None => Field::Null,
    };
}

/// Parse an opaque JSON string from the declarative side into a wire tree.
pub(crate) fn parse_json_string(raw: &str, context: &str) -> Result<serde_json::Value, ProviderError> {
    serde_json::from_str(raw)
        .map_err(|e| ProviderError::Validation(format!("{context} is not valid JSON: {e}")))
}

/// Serialise a wire tree into the opaque JSON string carried on the
/// declarative side, honouring the HTML-escape toggle.
pub(crate) fn to_json_string(
    value: &serde_json::Value,
    escape_html: bool,
) -> Result<String, ProviderError> {
    let raw = serde_json::to_string(value)?;
    if !escape_html {
        return Ok(raw);
    }
    Ok(raw
        .replace('&', "\\u0026")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e"))
}

/// Convert a dataset-rule value string to its wire shape: a string that
/// parses as a JSON scalar is emitted as that scalar, anything else is a jq
/// expression wrapped in `{"jqQuery": ...}`.
pub(crate) fn value_to_wire(raw: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(v) if v.is_number() || v.is_boolean() || v.is_null() || v.is_string() => v,
        _ => serde_json::json!({ "jqQuery": raw }),
    }
}

/// The inverse of [`value_to_wire`]: a `{"jqQuery": q}` object becomes the
/// plain string `q`, any scalar becomes its JSON text.
pub(crate) fn value_from_wire(value: &serde_json::Value) -> String {
    if let Some(q) = value.get("jqQuery").and_then(serde_json::Value::as_str) {
        return q.to_string();
    }
    value.to_string()
}
