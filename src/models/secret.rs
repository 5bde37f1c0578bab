//! Organization secret models.

use serde::{Deserialize, Serialize};

use crate::types::Field;

/// Declarative organization-secret state. The secret name is its identity
/// and cannot be renamed in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrganizationSecretState {
    pub secret_name: String,
    pub secret_value: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
}

/// The secret document as the API reads and writes it. Reads never return
/// the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSecret {
    pub secret_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_value: Option<String>,
    /// Tri-state on the wire: an explicit null clears the description on a
    /// PATCH, an omitted key leaves it alone.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_omits_value() {
        let s: OrganizationSecret = serde_json::from_value(json!({
            "secretName": "slack-token",
            "description": "Bot token"
        }))
        .unwrap();
        assert!(s.secret_value.is_none());
        assert_eq!(s.description.as_known().map(String::as_str), Some("Bot token"));
    }

    #[test]
    fn test_write_includes_value() {
        let s = OrganizationSecret {
            secret_name: "slack-token".into(),
            secret_value: Some("xoxb-1".into()),
            description: Field::Unset,
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v, json!({"secretName": "slack-token", "secretValue": "xoxb-1"}));
    }

    #[test]
    fn test_explicit_null_clears_description() {
        let s = OrganizationSecret {
            secret_name: "slack-token".into(),
            secret_value: None,
            description: Field::Null,
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v, json!({"secretName": "slack-token", "description": null}));
    }
}
