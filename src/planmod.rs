//! Plan-time field rules.
//!
//! These helpers implement the field-level behaviours applied during a plan:
//! semantic JSON comparison (so server re-serialisation never shows as
//! drift), carrying prior computed values forward, and defaults for unset
//! attributes.

use serde_json::Value;

/// Compare two strings as JSON documents.
///
/// Returns true when both parse as JSON and their trees are equal, ignoring
/// key order and whitespace. Falls back to string equality when either side
/// is not valid JSON.
pub fn json_semantically_equal(a: &str, b: &str) -> bool {
    match (
        serde_json::from_str::<Value>(a),
        serde_json::from_str::<Value>(b),
    ) {
        (Ok(va), Ok(vb)) => va == vb,
        _ => a == b,
    }
}

/// Whether two optional JSON strings are semantically equal.
///
/// Missing and null compare equal to each other but not to a value.
pub fn json_fields_equal(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => json_semantically_equal(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Apply `use_state_for_unknown`: if `proposed` has no value at `key` and the
/// prior state does, copy the prior value into the proposed object.
pub fn use_state_for_unknown(proposed: &mut Value, prior: &Value, key: &str) {
    let prior_value = match prior.get(key) {
        Some(v) if !v.is_null() => v.clone(),
        _ => return,
    };
    if let Value::Object(map) = proposed {
        let missing = matches!(map.get(key), None | Some(Value::Null));
        if missing {
            map.insert(key.to_string(), prior_value);
        }
    }
}

/// Apply a default: if `proposed` has no value at `key`, insert `default`.
pub fn default_for_unset(proposed: &mut Value, key: &str, default: Value) {
    if let Value::Object(map) = proposed {
        let missing = matches!(map.get(key), None | Some(Value::Null));
        if missing {
            map.insert(key.to_string(), default);
        }
    }
}

/// Suppress spurious diffs on a semantic-JSON attribute: when the proposed
/// string differs from the prior only in serialisation, keep the prior form
/// so the plan shows no change.
pub fn normalize_semantic_json(proposed: &mut Value, prior: &Value, key: &str) {
    let (Some(prior_str), Some(proposed_str)) = (
        prior.get(key).and_then(Value::as_str),
        proposed.get(key).and_then(Value::as_str),
    ) else {
        return;
    };
    if prior_str != proposed_str && json_semantically_equal(prior_str, proposed_str) {
        if let Value::Object(map) = proposed {
            map.insert(key.to_string(), Value::String(prior_str.to_string()));
        }
    }
}
