//! Team models.

use serde::{Deserialize, Serialize};

use crate::types::Field;

/// Declarative team state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TeamState {
    /// Team name; doubles as the identifier in team endpoints.
    pub name: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub users: Field<Vec<String>>,

    // Server-computed
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub provider: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_at: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated_at: Field<String>,
}

/// The team document as the API reads and writes it. Users come back as
/// objects with an `email` field on reads but are sent as plain strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Team {
    /// User emails, whether the server returned strings or objects.
    pub fn user_emails(&self) -> Vec<String> {
        self.users
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|u| match u {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Object(map) => map
                    .get("email")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect()
    }
}
