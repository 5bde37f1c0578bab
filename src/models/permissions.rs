//! Permission models shared by action, blueprint and page permissions.
//!
//! All three are sub-resources: they live inside their parent document (or at
//! a PATCH-only endpoint) and delete only drops orchestrator state. Assignee
//! lists are sorted before sending because the server stores them sorted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Field;

/// The recurring `{users, roles, teams, owned_by_team}` assignee block on
/// the declarative side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssigneesState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub users: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub roles: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub teams: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub owned_by_team: Field<bool>,
}

/// Wire form of an assignee block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssigneesBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by_team: Option<bool>,
}

impl AssigneesBody {
    /// Sort every assignee list in place. The server stores them sorted, so
    /// sending sorted lists keeps round-trips drift-free.
    pub fn sort(&mut self) {
        if let Some(users) = &mut self.users {
            users.sort();
        }
        if let Some(roles) = &mut self.roles {
            roles.sort();
        }
        if let Some(teams) = &mut self.teams {
            teams.sort();
        }
    }
}

// ---------------------------------------------------------------------------
// Action permissions
// ---------------------------------------------------------------------------

/// Declarative state for an action's execute/approve ACLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionPermissionsState {
    pub action_identifier: String,
    pub blueprint_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute: Option<ExecutePermissionsState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approve: Option<ApprovePermissionsState>,
}

/// Who may execute the action.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutePermissionsState {
    #[serde(flatten)]
    pub assignees: AssigneesState,
    /// Dynamic-permission policy as an opaque JSON string.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub policy: Field<String>,
}

/// Who may approve runs of the action.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApprovePermissionsState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub users: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub roles: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub teams: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub policy: Field<String>,
}

/// Wire form of the action permissions document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionPermissionsBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute: Option<ExecutePermissionsBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approve: Option<ApprovePermissionsBody>,
}

/// Wire form of the execute block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutePermissionsBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by_team: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<serde_json::Value>,
}

/// Wire form of the approve block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApprovePermissionsBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Blueprint permissions
// ---------------------------------------------------------------------------

/// Declarative state for a blueprint's entity ACLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlueprintPermissionsState {
    pub blueprint_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<EntityPermissionsState>,
}

/// Per-operation ACLs for entities of the blueprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntityPermissionsState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<AssigneesState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unregister: Option<AssigneesState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<AssigneesState>,
    /// Per-property update ACLs, keyed by property name. Metadata properties
    /// (`$title`, `$identifier`, `$icon`, `$team`) live in
    /// [`update_metadata_properties`](Self::update_metadata_properties)
    /// because declarative keys cannot start with `$`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub update_properties: BTreeMap<String, AssigneesState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_metadata_properties: Option<MetadataPropertiesState>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub update_relations: BTreeMap<String, AssigneesState>,
}

/// ACLs for the `$`-prefixed metadata properties, under plain names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataPropertiesState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<AssigneesState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<AssigneesState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<AssigneesState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<AssigneesState>,
}

/// Wire form of the blueprint permissions document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlueprintPermissionsBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<EntityPermissionsBody>,
}

/// Wire form of the per-operation entity ACLs. `updateProperties` holds the
/// unified map including `$`-prefixed metadata keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityPermissionsBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<AssigneesBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unregister: Option<AssigneesBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<AssigneesBody>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub update_properties: BTreeMap<String, AssigneesBody>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub update_relations: BTreeMap<String, AssigneesBody>,
}

// ---------------------------------------------------------------------------
// Page permissions
// ---------------------------------------------------------------------------

/// Declarative state for a page's read ACLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PagePermissionsState {
    pub page_identifier: String,
    pub read: PageReadPermissionsState,
}

/// Who may read the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageReadPermissionsState {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub users: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub roles: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub teams: Field<Vec<String>>,
}

/// Wire form of the page permissions document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PagePermissionsBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<AssigneesBody>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assignees_sort() {
        let mut body = AssigneesBody {
            users: Some(vec!["zoe@example.com".into(), "amy@example.com".into()]),
            roles: Some(vec!["Member".into(), "Admin".into()]),
            teams: None,
            owned_by_team: Some(true),
        };
        body.sort();
        assert_eq!(body.users.as_ref().unwrap()[0], "amy@example.com");
        assert_eq!(body.roles.as_ref().unwrap(), &["Admin", "Member"]);
    }

    #[test]
    fn test_update_properties_keeps_dollar_keys_on_wire() {
        let body: EntityPermissionsBody = serde_json::from_value(json!({
            "updateProperties": {
                "$title": {"roles": ["Admin"]},
                "language": {"roles": ["Member"]}
            }
        }))
        .unwrap();
        assert!(body.update_properties.contains_key("$title"));
        assert!(body.update_properties.contains_key("language"));
    }

    #[test]
    fn test_empty_lists_survive_round_trip() {
        let body = AssigneesBody {
            users: Some(vec![]),
            roles: None,
            teams: None,
            owned_by_team: None,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v, json!({"users": []}));
        let back: AssigneesBody = serde_json::from_value(v).unwrap();
        assert_eq!(back.users.as_deref(), Some(&[][..]));
    }
}
