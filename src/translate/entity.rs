//! Entity translation: typed property values to and from the wire maps.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ProviderError;
use crate::models::entity::{
    Entity, EntityArrayPropertiesState, EntityPropertiesState, EntityRelationsState, EntityState,
};
use crate::types::Field;

use super::{computed_field, parse_json_string, refresh_field, to_json_string};

/// Build the wire entity from declarative state. Null property values are
/// sent as explicit JSON nulls so the server clears them.
pub fn entity_to_body(state: &EntityState) -> Result<Entity, ProviderError> {
    let mut properties = BTreeMap::new();
    if let Some(props) = &state.properties {
        for (name, v) in &props.string_props {
            insert_value(&mut properties, name, v, |s| Value::String(s.clone()));
        }
        for (name, v) in &props.number_props {
            insert_value(&mut properties, name, v, |n| number_value(*n));
        }
        for (name, v) in &props.boolean_props {
            insert_value(&mut properties, name, v, |b| Value::Bool(*b));
        }
        for (name, v) in &props.object_props {
            match v {
                Field::Known(raw) => {
                    properties.insert(
                        name.clone(),
                        parse_json_string(raw, &format!("object property {name}"))?,
                    );
                },
                Field::Null => {
                    properties.insert(name.clone(), Value::Null);
                },
                Field::Unset => {},
            }
        }
        if let Some(arrays) = &props.array_props {
            for (name, v) in &arrays.string_items {
                insert_value(&mut properties, name, v, |vs| {
                    Value::Array(vs.iter().cloned().map(Value::String).collect())
                });
            }
            for (name, v) in &arrays.number_items {
                insert_value(&mut properties, name, v, |vs| {
                    Value::Array(vs.iter().map(|n| number_value(*n)).collect())
                });
            }
            for (name, v) in &arrays.boolean_items {
                insert_value(&mut properties, name, v, |vs| {
                    Value::Array(vs.iter().copied().map(Value::Bool).collect())
                });
            }
            for (name, v) in &arrays.object_items {
                match v {
                    Field::Known(raws) => {
                        let parsed = raws
                            .iter()
                            .map(|raw| {
                                parse_json_string(raw, &format!("object array property {name}"))
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        properties.insert(name.clone(), Value::Array(parsed));
                    },
                    Field::Null => {
                        properties.insert(name.clone(), Value::Null);
                    },
                    Field::Unset => {},
                }
            }
        }
    }

    let mut relations = BTreeMap::new();
    if let Some(rels) = &state.relations {
        for (name, v) in &rels.single_relations {
            insert_value(&mut relations, name, v, |s| Value::String(s.clone()));
        }
        for (name, v) in &rels.many_relations {
            insert_value(&mut relations, name, v, |vs| {
                Value::Array(vs.iter().cloned().map(Value::String).collect())
            });
        }
    }

    Ok(Entity {
        identifier: state.identifier.to_body().cloned(),
        title: state.title.to_body().cloned(),
        icon: state.icon.to_body().cloned(),
        blueprint: Some(state.blueprint.clone()),
        team: state.teams.to_body().cloned(),
        properties: if properties.is_empty() { None } else { Some(properties) },
        relations: if relations.is_empty() { None } else { Some(relations) },
        created_at: None,
        created_by: None,
        updated_at: None,
        updated_by: None,
    })
}

/// Fold a freshly read entity document back into declarative state.
pub fn refresh_entity_state(
    state: &mut EntityState,
    wire: &Entity,
    escape_html: bool,
) -> Result<(), ProviderError> {
    if let Some(identifier) = &wire.identifier {
        state.identifier = Field::Known(identifier.clone());
    }
    if let Some(blueprint) = &wire.blueprint {
        state.blueprint = blueprint.clone();
    }
    refresh_field(&mut state.title, wire.title.as_ref());
    refresh_field(&mut state.icon, wire.icon.as_ref());
    refresh_field(&mut state.teams, wire.team.as_ref());

    refresh_properties(state, wire, escape_html)?;
    refresh_relations(state, wire);

    computed_field(&mut state.created_at, wire.created_at.as_ref());
    computed_field(&mut state.created_by, wire.created_by.as_ref());
    computed_field(&mut state.updated_at, wire.updated_at.as_ref());
    computed_field(&mut state.updated_by, wire.updated_by.as_ref());
    Ok(())
}

fn insert_value<T, F: Fn(&T) -> Value>(
    out: &mut BTreeMap<String, Value>,
    name: &str,
    field: &Field<T>,
    render: F,
) {
    match field {
        Field::Known(v) => {
            out.insert(name.to_string(), render(v));
        },
        Field::Null => {
            out.insert(name.to_string(), Value::Null);
        },
        Field::Unset => {},
    }
}

fn number_value(v: f64) -> Value {
    serde_json::Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// Refresh the typed property maps from the wire's free-form value map. The
/// declarative keys drive the walk: values are re-read for keys the user
/// declared, and keys absent from the wire become null.
fn refresh_properties(
    state: &mut EntityState,
    wire: &Entity,
    escape_html: bool,
) -> Result<(), ProviderError> {
    let Some(props) = &mut state.properties else {
        return Ok(());
    };
    let empty = BTreeMap::new();
    let values = wire.properties.as_ref().unwrap_or(&empty);

    for (name, field) in &mut props.string_props {
        if field.is_unset() {
            continue;
        }
        let server = values.get(name).and_then(Value::as_str).map(str::to_string);
        refresh_field(field, server.as_ref());
    }
    for (name, field) in &mut props.number_props {
        if field.is_unset() {
            continue;
        }
        let server = values.get(name).and_then(Value::as_f64);
        refresh_field(field, server.as_ref());
    }
    for (name, field) in &mut props.boolean_props {
        if field.is_unset() {
            continue;
        }
        let server = values.get(name).and_then(Value::as_bool);
        refresh_field(field, server.as_ref());
    }
    for (name, field) in &mut props.object_props {
        if field.is_unset() {
            continue;
        }
        let server = match values.get(name) {
            Some(Value::Null) | None => None,
            Some(v) => Some(to_json_string(v, escape_html)?),
        };
        refresh_field(field, server.as_ref());
    }
    if let Some(arrays) = &mut props.array_props {
        refresh_array_properties(arrays, values, escape_html)?;
    }
    Ok(())
}

fn refresh_array_properties(
    arrays: &mut EntityArrayPropertiesState,
    values: &BTreeMap<String, Value>,
    escape_html: bool,
) -> Result<(), ProviderError> {
    for (name, field) in &mut arrays.string_items {
        if field.is_unset() {
            continue;
        }
        let server = values.get(name).and_then(Value::as_array).map(|vs| {
            vs.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        });
        refresh_field(field, server.as_ref());
    }
    for (name, field) in &mut arrays.number_items {
        if field.is_unset() {
            continue;
        }
        let server = values
            .get(name)
            .and_then(Value::as_array)
            .map(|vs| vs.iter().filter_map(Value::as_f64).collect::<Vec<_>>());
        refresh_field(field, server.as_ref());
    }
    for (name, field) in &mut arrays.boolean_items {
        if field.is_unset() {
            continue;
        }
        let server = values
            .get(name)
            .and_then(Value::as_array)
            .map(|vs| vs.iter().filter_map(Value::as_bool).collect::<Vec<_>>());
        refresh_field(field, server.as_ref());
    }
    for (name, field) in &mut arrays.object_items {
        if field.is_unset() {
            continue;
        }
        let server = match values.get(name).and_then(Value::as_array) {
            Some(vs) => Some(
                vs.iter()
                    .map(|v| to_json_string(v, escape_html))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        refresh_field(field, server.as_ref());
    }
    Ok(())
}

fn refresh_relations(state: &mut EntityState, wire: &Entity) {
    let Some(rels) = &mut state.relations else {
        return;
    };
    let empty = BTreeMap::new();
    let values = wire.relations.as_ref().unwrap_or(&empty);

    for (name, field) in &mut rels.single_relations {
        if field.is_unset() {
            continue;
        }
        let server = values.get(name).and_then(Value::as_str).map(str::to_string);
        refresh_field(field, server.as_ref());
    }
    for (name, field) in &mut rels.many_relations {
        if field.is_unset() {
            continue;
        }
        let server = values.get(name).and_then(Value::as_array).map(|vs| {
            vs.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        });
        refresh_field(field, server.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_state() -> EntityState {
        let mut props = EntityPropertiesState::default();
        props
            .string_props
            .insert("language".to_string(), Field::Known("rust".to_string()));
        props
            .number_props
            .insert("replicas".to_string(), Field::Known(3.0));
        props
            .object_props
            .insert("config".to_string(), Field::Known(r#"{"retries":3}"#.to_string()));

        let mut rels = EntityRelationsState::default();
        rels.single_relations
            .insert("owner".to_string(), Field::Known("platform".to_string()));
        rels.many_relations.insert(
            "deps".to_string(),
            Field::Known(vec!["db".to_string(), "cache".to_string()]),
        );

        EntityState {
            identifier: Field::Known("svc-api".to_string()),
            blueprint: "svc".to_string(),
            properties: Some(props),
            relations: Some(rels),
            ..Default::default()
        }
    }

    #[test]
    fn test_to_body_renders_typed_values() {
        let wire = entity_to_body(&sample_state()).unwrap();
        let v = serde_json::to_value(&wire).unwrap();
        assert_eq!(v["identifier"], "svc-api");
        assert_eq!(v["properties"]["language"], "rust");
        assert_eq!(v["properties"]["replicas"], 3.0);
        assert_eq!(v["properties"]["config"], json!({"retries": 3}));
        assert_eq!(v["relations"]["owner"], "platform");
        assert_eq!(v["relations"]["deps"], json!(["db", "cache"]));
    }

    #[test]
    fn test_null_property_clears_server_field() {
        let mut state = sample_state();
        state
            .properties
            .as_mut()
            .unwrap()
            .string_props
            .insert("notes".to_string(), Field::Null);
        let wire = entity_to_body(&state).unwrap();
        assert_eq!(
            wire.properties.as_ref().unwrap().get("notes"),
            Some(&Value::Null)
        );
    }

    #[test]
    fn test_round_trip_preserves_user_fields() {
        let state = sample_state();
        let wire = entity_to_body(&state).unwrap();

        let mut refreshed = sample_state();
        refresh_entity_state(&mut refreshed, &wire, true).unwrap();

        let props = refreshed.properties.unwrap();
        assert_eq!(props.string_props["language"], Field::Known("rust".to_string()));
        assert_eq!(props.number_props["replicas"], Field::Known(3.0));
        assert_eq!(
            props.object_props["config"],
            Field::Known(r#"{"retries":3}"#.to_string())
        );
        let rels = refreshed.relations.unwrap();
        assert_eq!(
            rels.many_relations["deps"],
            Field::Known(vec!["db".to_string(), "cache".to_string()])
        );
    }

    #[test]
    fn test_refresh_adopts_generated_identifier() {
        let wire: Entity = serde_json::from_value(json!({
            "identifier": "e_generated",
            "blueprint": "svc",
            "createdAt": "2024-05-01T00:00:00Z"
        }))
        .unwrap();

        let mut state = EntityState {
            blueprint: "svc".to_string(),
            ..Default::default()
        };
        refresh_entity_state(&mut state, &wire, true).unwrap();

        assert_eq!(state.identifier, Field::Known("e_generated".to_string()));
        assert!(state.created_at.is_known());
    }
}
