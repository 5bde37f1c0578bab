//! Folder models: sidebar grouping elements.
//!
//! Folders are addressed through their sidebar. The read endpoint returns
//! the whole sidebar document and the provider picks its folder out of it.

use serde::{Deserialize, Serialize};

use crate::types::Field;

/// Sidebar folders default to the catalog sidebar.
pub const DEFAULT_SIDEBAR: &str = "catalog";

/// Declarative folder state. Folders are beta-gated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FolderState {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    /// Sidebar hosting the folder; defaults to `catalog`.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub sidebar: Field<String>,
    /// Identifier of the sidebar element this folder is ordered after.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub after: Field<String>,
    /// Parent folder identifier.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub parent: Field<String>,
}

impl FolderState {
    /// The sidebar to address, falling back to the default.
    pub fn sidebar_or_default(&self) -> &str {
        self.sidebar.as_known().map(String::as_str).unwrap_or(DEFAULT_SIDEBAR)
    }
}

/// One folder item inside a sidebar document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Folder {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, rename = "sidebarType", skip_serializing_if = "Option::is_none")]
    pub sidebar_type: Option<String>,
}

/// The sidebar document returned by `GET v1/sidebars/{sidebar}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Sidebar {
    #[serde(default)]
    pub items: Vec<SidebarItem>,
}

/// One item in the sidebar; folders carry `sidebarType: "folder"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SidebarItem {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, rename = "sidebarType", skip_serializing_if = "Option::is_none")]
    pub sidebar_type: Option<String>,
}

impl Sidebar {
    /// Find the folder item with the given identifier, if any.
    pub fn find_folder(&self, identifier: &str) -> Option<&SidebarItem> {
        self.items.iter().find(|item| {
            item.identifier == identifier
                && item.sidebar_type.as_deref().unwrap_or("folder") == "folder"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sidebar_lookup() {
        let sidebar: Sidebar = serde_json::from_value(json!({
            "items": [
                {"identifier": "svc-page", "sidebarType": "page"},
                {"identifier": "infra", "title": "Infrastructure", "sidebarType": "folder"}
            ]
        }))
        .unwrap();
        assert!(sidebar.find_folder("svc-page").is_none());
        let folder = sidebar.find_folder("infra").unwrap();
        assert_eq!(folder.title.as_deref(), Some("Infrastructure"));
    }

    #[test]
    fn test_sidebar_or_default() {
        let state = FolderState {
            identifier: "infra".into(),
            ..Default::default()
        };
        assert_eq!(state.sidebar_or_default(), "catalog");

        let state = FolderState {
            identifier: "infra".into(),
            sidebar: crate::types::Field::Known("service".into()),
            ..Default::default()
        };
        assert_eq!(state.sidebar_or_default(), "service");
    }
}
