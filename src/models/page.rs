//! Page models: sidebar navigation elements carrying widget definitions.

use serde::{Deserialize, Serialize};

use crate::types::Field;

/// Declarative page state. Pages are beta-gated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageState {
    pub identifier: String,
    /// `blueprint-entities`, `dashboard` or `home`.
    #[serde(rename = "type")]
    pub page_type: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub locked: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub blueprint: Field<String>,
    /// Identifier of the sidebar element this page is ordered after.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub after: Field<String>,
    /// Parent folder in the sidebar.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub parent: Field<String>,
    /// Widget definitions as opaque JSON strings.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub widgets: Field<Vec<String>>,

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

/// The page document as the API reads and writes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub identifier: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widgets: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Import ID of the home page, which cannot be created or deleted.
pub const HOME_PAGE_ID: &str = "$home";
