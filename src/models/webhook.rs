//! Webhook models: ingest endpoints with mapping rules that turn incoming
//! JSON into entity upserts or deletes.

use serde::{Deserialize, Serialize};

use crate::types::Field;

/// Declarative webhook state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebhookState {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub enabled: Field<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<WebhookSecurityState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<WebhookMappingState>,

    // Server-computed
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub url: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub webhook_key: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_at: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_by: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated_at: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated_by: Field<String>,
}

/// Request signature verification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebhookSecurityState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub secret: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub signature_header_name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub signature_algorithm: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub signature_prefix: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub request_identifier_path: Field<String>,
}

/// One mapping rule from incoming JSON to an entity operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebhookMappingState {
    /// Blueprint of the entities the rule produces.
    pub blueprint: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub filter: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub items_to_parse: Field<String>,
    /// jq expression selecting the delete operation instead of upsert.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub operation: Field<String>,
    pub entity: WebhookEntityMappingState,
}

/// The entity template of a mapping rule; every slot is a jq expression.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebhookEntityMappingState {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub team: Field<String>,
    /// Property expressions as an opaque JSON string.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub properties: Field<String>,
    /// Relation expressions as an opaque JSON string.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub relations: Field<String>,
}

/// The webhook document as the API reads and writes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<WebhookSecurityBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings: Option<Vec<WebhookMappingBody>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Wire form of the security settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSecurityBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_header_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_identifier_path: Option<String>,
}

/// Wire form of one mapping rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookMappingBody {
    pub blueprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_to_parse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<serde_json::Value>,
    pub entity: WebhookEntityMappingBody,
}

/// Wire form of the entity template; properties and relations are parsed
/// JSON trees.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebhookEntityMappingBody {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_webhook_wire_decoding() {
        let raw = json!({
            "identifier": "github-ingest",
            "enabled": true,
            "url": "https://ingest.getport.io/hooks/abc",
            "webhookKey": "abc",
            "mappings": [{
                "blueprint": "repo",
                "filter": ".headers.event == \"push\"",
                "entity": {
                    "identifier": ".body.repository.name",
                    "properties": {"stars": ".body.repository.stargazers_count"}
                }
            }]
        });
        let w: Webhook = serde_json::from_value(raw).unwrap();
        assert_eq!(w.webhook_key.as_deref(), Some("abc"));
        let mapping = &w.mappings.as_ref().unwrap()[0];
        assert_eq!(mapping.entity.identifier, ".body.repository.name");
    }
}
