//! Permission translation: assignee blocks, list sorting and the
//! `$`-prefixed metadata key split.

use std::collections::BTreeMap;

use crate::error::ProviderError;
use crate::models::permissions::{
    ActionPermissionsBody, ActionPermissionsState, ApprovePermissionsBody,
    ApprovePermissionsState, AssigneesBody, AssigneesState, BlueprintPermissionsBody,
    BlueprintPermissionsState, EntityPermissionsBody, EntityPermissionsState,
    ExecutePermissionsBody, ExecutePermissionsState, MetadataPropertiesState,
    PagePermissionsBody, PagePermissionsState, PageReadPermissionsState,
};
use crate::types::Field;

use super::{parse_json_string, refresh_field, to_json_string};

/// Declarative names of the metadata properties, paired with their wire keys.
const METADATA_KEYS: [(&str, &str); 4] = [
    ("title", "$title"),
    ("identifier", "$identifier"),
    ("icon", "$icon"),
    ("team", "$team"),
];

fn sorted(list: &[String]) -> Vec<String> {
    let mut out = list.to_vec();
    out.sort();
    out
}

fn assignees_body(state: &AssigneesState) -> AssigneesBody {
    AssigneesBody {
        users: state.users.to_body().map(|v| sorted(v)),
        roles: state.roles.to_body().map(|v| sorted(v)),
        teams: state.teams.to_body().map(|v| sorted(v)),
        owned_by_team: state.owned_by_team.to_body().copied(),
    }
}

fn refresh_assignees(state: &mut AssigneesState, wire: &AssigneesBody) {
    refresh_field(&mut state.users, wire.users.as_ref());
    refresh_field(&mut state.roles, wire.roles.as_ref());
    refresh_field(&mut state.teams, wire.teams.as_ref());
    refresh_field(&mut state.owned_by_team, wire.owned_by_team.as_ref());
}

// -------------------------------------------------------------------------
// Action permissions
// -------------------------------------------------------------------------

/// Build the wire body for an action's execute/approve ACLs.
pub fn action_permissions_to_body(
    state: &ActionPermissionsState,
) -> Result<ActionPermissionsBody, ProviderError> {
    let execute = state
        .execute
        .as_ref()
        .map(|e| -> Result<_, ProviderError> {
            let assignees = assignees_body(&e.assignees);
            let policy = e
                .policy
                .to_body()
                .map(|raw| parse_json_string(raw, "execute policy"))
                .transpose()?;
            Ok(ExecutePermissionsBody {
                users: assignees.users,
                roles: assignees.roles,
                teams: assignees.teams,
                owned_by_team: assignees.owned_by_team,
                policy,
            })
        })
        .transpose()?;

    let approve = state
        .approve
        .as_ref()
        .map(|a| -> Result<_, ProviderError> {
            Ok(ApprovePermissionsBody {
                users: a.users.to_body().map(|v| sorted(v)),
                roles: a.roles.to_body().map(|v| sorted(v)),
                teams: a.teams.to_body().map(|v| sorted(v)),
                policy: a
                    .policy
                    .to_body()
                    .map(|raw| parse_json_string(raw, "approve policy"))
                    .transpose()?,
            })
        })
        .transpose()?;

    Ok(ActionPermissionsBody { execute, approve })
}

/// Fold a freshly read action permissions body back into declarative state.
pub fn refresh_action_permissions_state(
    state: &mut ActionPermissionsState,
    wire: &ActionPermissionsBody,
    escape_html: bool,
) -> Result<(), ProviderError> {
    if let Some(body) = &wire.execute {
        let e = state.execute.get_or_insert_with(ExecutePermissionsState::default);
        refresh_field(&mut e.assignees.users, body.users.as_ref());
        refresh_field(&mut e.assignees.roles, body.roles.as_ref());
        refresh_field(&mut e.assignees.teams, body.teams.as_ref());
        refresh_field(&mut e.assignees.owned_by_team, body.owned_by_team.as_ref());
        let policy = body
            .policy
            .as_ref()
            .map(|v| to_json_string(v, escape_html))
            .transpose()?;
        refresh_field(&mut e.policy, policy.as_ref());
    }
    if let Some(body) = &wire.approve {
        let a = state.approve.get_or_insert_with(ApprovePermissionsState::default);
        refresh_field(&mut a.users, body.users.as_ref());
        refresh_field(&mut a.roles, body.roles.as_ref());
        refresh_field(&mut a.teams, body.teams.as_ref());
        let policy = body
            .policy
            .as_ref()
            .map(|v| to_json_string(v, escape_html))
            .transpose()?;
        refresh_field(&mut a.policy, policy.as_ref());
    }
    Ok(())
}

// -------------------------------------------------------------------------
// Blueprint permissions
// -------------------------------------------------------------------------

/// Build the wire body for a blueprint's entity ACLs. The metadata block is
/// merged into `updateProperties` under its `$`-prefixed wire keys.
pub fn blueprint_permissions_to_body(
    state: &BlueprintPermissionsState,
) -> Result<BlueprintPermissionsBody, ProviderError> {
    let entities = state.entities.as_ref().map(|e| {
        let mut update_properties: BTreeMap<String, AssigneesBody> = e
            .update_properties
            .iter()
            .map(|(name, a)| (name.clone(), assignees_body(a)))
            .collect();
        if let Some(meta) = &e.update_metadata_properties {
            for (field, wire_key) in metadata_entries(meta) {
                update_properties.insert(wire_key.to_string(), assignees_body(field));
            }
        }
        EntityPermissionsBody {
            register: e.register.as_ref().map(assignees_body),
            unregister: e.unregister.as_ref().map(assignees_body),
            update: e.update.as_ref().map(assignees_body),
            update_properties,
            update_relations: e
                .update_relations
                .iter()
                .map(|(name, a)| (name.clone(), assignees_body(a)))
                .collect(),
        }
    });
    Ok(BlueprintPermissionsBody { entities })
}

fn metadata_entries(meta: &MetadataPropertiesState) -> Vec<(&AssigneesState, &'static str)> {
    let mut out = Vec::new();
    for (name, wire_key) in METADATA_KEYS {
        let field = match name {
            "title" => meta.title.as_ref(),
            "identifier" => meta.identifier.as_ref(),
            "icon" => meta.icon.as_ref(),
            _ => meta.team.as_ref(),
        };
        if let Some(a) = field {
            out.push((a, wire_key));
        }
    }
    out
}

/// Fold a freshly read blueprint permissions body back into declarative
/// state, splitting `$`-prefixed keys into the metadata block.
pub fn refresh_blueprint_permissions_state(
    state: &mut BlueprintPermissionsState,
    wire: &BlueprintPermissionsBody,
) {
    let Some(body) = &wire.entities else {
        return;
    };
    let e = state.entities.get_or_insert_with(EntityPermissionsState::default);

    if let Some(register) = &body.register {
        refresh_assignees(e.register.get_or_insert_with(Default::default), register);
    }
    if let Some(unregister) = &body.unregister {
        refresh_assignees(e.unregister.get_or_insert_with(Default::default), unregister);
    }
    if let Some(update) = &body.update {
        refresh_assignees(e.update.get_or_insert_with(Default::default), update);
    }

    for (key, assignees) in &body.update_properties {
        if let Some(name) = key.strip_prefix('$') {
            let meta = e
                .update_metadata_properties
                .get_or_insert_with(Default::default);
            let slot = match name {
                "title" => &mut meta.title,
                "identifier" => &mut meta.identifier,
                "icon" => &mut meta.icon,
                "team" => &mut meta.team,
                _ => continue,
            };
            refresh_assignees(slot.get_or_insert_with(Default::default), assignees);
        } else if let Some(existing) = e.update_properties.get_mut(key) {
            refresh_assignees(existing, assignees);
        }
    }
    for (key, assignees) in &body.update_relations {
        if let Some(existing) = e.update_relations.get_mut(key) {
            refresh_assignees(existing, assignees);
        }
    }
}

// -------------------------------------------------------------------------
// Page permissions
// -------------------------------------------------------------------------

/// Build the wire body for a page's read ACLs. Set lists are emitted even
/// when empty; the server distinguishes empty from absent.
pub fn page_permissions_to_body(state: &PagePermissionsState) -> PagePermissionsBody {
    PagePermissionsBody {
        read: Some(AssigneesBody {
            users: state.read.users.to_body().map(|v| sorted(v)),
            roles: state.read.roles.to_body().map(|v| sorted(v)),
            teams: state.read.teams.to_body().map(|v| sorted(v)),
            owned_by_team: None,
        }),
    }
}

/// Fold a freshly read page permissions body back into declarative state.
pub fn refresh_page_permissions_state(
    state: &mut PagePermissionsState,
    wire: &PagePermissionsBody,
) {
    let Some(read) = &wire.read else {
        return;
    };
    refresh_field(&mut state.read.users, read.users.as_ref());
    refresh_field(&mut state.read.roles, read.roles.as_ref());
    refresh_field(&mut state.read.teams, read.teams.as_ref());
}

/// Reject `update_properties` keys that start with `$`; those are reserved
/// for the metadata block.
pub fn validate_update_property_keys(
    state: &BlueprintPermissionsState,
) -> Result<(), ProviderError> {
    if let Some(entities) = &state.entities {
        for key in entities.update_properties.keys() {
            if key.starts_with('$') {
                return Err(ProviderError::Validation(format!(
                    "update_properties key {key} is reserved; use update_metadata_properties"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignees(roles: &[&str]) -> AssigneesState {
        AssigneesState {
            roles: Field::Known(roles.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_assignee_lists_are_sorted() {
        let state = assignees(&["Member", "Admin"]);
        let body = assignees_body(&state);
        assert_eq!(body.roles.unwrap(), vec!["Admin", "Member"]);
    }

    #[test]
    fn test_sorted_round_trip_is_fixed_point() {
        let mut state = assignees(&["Member", "Admin"]);
        let body = assignees_body(&state);
        refresh_assignees(&mut state, &body);
        assert_eq!(
            state.roles,
            Field::Known(vec!["Admin".to_string(), "Member".to_string()])
        );
        // A second pass changes nothing
        let body2 = assignees_body(&state);
        assert_eq!(body, body2);
    }

    #[test]
    fn test_empty_lists_stay_empty() {
        let state = AssigneesState {
            users: Field::Known(vec![]),
            ..Default::default()
        };
        let body = assignees_body(&state);
        assert_eq!(body.users.as_deref(), Some(&[][..]));
        assert!(body.roles.is_none());
    }

    #[test]
    fn test_metadata_keys_merge_into_update_properties() {
        let mut entities = EntityPermissionsState::default();
        entities
            .update_properties
            .insert("language".to_string(), assignees(&["Member"]));
        entities.update_metadata_properties = Some(MetadataPropertiesState {
            title: Some(assignees(&["Admin"])),
            ..Default::default()
        });
        let state = BlueprintPermissionsState {
            blueprint_identifier: "svc".to_string(),
            entities: Some(entities),
        };

        let body = blueprint_permissions_to_body(&state).unwrap();
        let update_properties = body.entities.unwrap().update_properties;
        assert!(update_properties.contains_key("$title"));
        assert!(update_properties.contains_key("language"));
    }

    #[test]
    fn test_metadata_keys_split_on_refresh() {
        let mut entities = EntityPermissionsState::default();
        entities
            .update_properties
            .insert("language".to_string(), assignees(&["Member"]));
        entities.update_metadata_properties = Some(MetadataPropertiesState {
            title: Some(assignees(&["Admin"])),
            ..Default::default()
        });
        let mut state = BlueprintPermissionsState {
            blueprint_identifier: "svc".to_string(),
            entities: Some(entities),
        };

        let body = blueprint_permissions_to_body(&state).unwrap();
        refresh_blueprint_permissions_state(&mut state, &body);

        let entities = state.entities.unwrap();
        let meta = entities.update_metadata_properties.unwrap();
        assert_eq!(
            meta.title.unwrap().roles,
            Field::Known(vec!["Admin".to_string()])
        );
        // The `$` key never leaks into the plain map
        assert!(!entities.update_properties.contains_key("$title"));
        assert_eq!(
            entities.update_properties["language"].roles,
            Field::Known(vec!["Member".to_string()])
        );
    }

    #[test]
    fn test_reserved_key_validation() {
        let mut entities = EntityPermissionsState::default();
        entities
            .update_properties
            .insert("$title".to_string(), assignees(&["Admin"]));
        let state = BlueprintPermissionsState {
            blueprint_identifier: "svc".to_string(),
            entities: Some(entities),
        };
        let err = validate_update_property_keys(&state).unwrap_err();
        assert!(err.to_string().contains("$title"));
    }

    #[test]
    fn test_execute_policy_round_trip() {
        let mut state = ActionPermissionsState {
            action_identifier: "restart".to_string(),
            blueprint_identifier: "svc".to_string(),
            execute: Some(ExecutePermissionsState {
                assignees: assignees(&["Admin"]),
                policy: Field::Known(r#"{"queries":{}}"#.to_string()),
            }),
            approve: None,
        };
        let body = action_permissions_to_body(&state).unwrap();
        assert!(body.execute.as_ref().unwrap().policy.is_some());

        refresh_action_permissions_state(&mut state, &body, true).unwrap();
        assert_eq!(
            state.execute.unwrap().policy,
            Field::Known(r#"{"queries":{}}"#.to_string())
        );
    }
}
