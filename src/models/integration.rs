//! Integration models: installed data-source bindings.

use serde::{Deserialize, Serialize};

use crate::types::Field;

/// Declarative integration state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IntegrationState {
    /// Installation identifier.
    pub installation_id: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub installation_app_type: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub version: Field<String>,
    /// Resource-mapping configuration as an opaque JSON string.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub config: Field<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kafka_changelog_destination: Option<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub webhook_changelog_destination_url: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub webhook_changelog_destination_agent: Field<bool>,

    // Server-computed
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_at: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated_at: Field<String>,
}

/// The integration document as the API reads and writes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub installation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_app_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog_destination: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integration_wire_decoding() {
        let raw = json!({
            "installationId": "github-main",
            "installationAppType": "GitHub",
            "config": {"resources": []},
            "changelogDestination": {"type": "KAFKA"}
        });
        let i: Integration = serde_json::from_value(raw).unwrap();
        assert_eq!(i.installation_id, "github-main");
        assert_eq!(i.changelog_destination.as_ref().unwrap()["type"], "KAFKA");
    }
}
