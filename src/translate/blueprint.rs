//! Blueprint translation: typed property maps to and from the wire schema.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ProviderError;
use crate::models::blueprint::{
    ArrayPropState, Blueprint, BlueprintPropertiesState, BlueprintSchema, BlueprintState,
    BooleanItemsState, BooleanPropState, ChangelogDestinationBody, ChangelogDestinationState,
    InlineCalculationState, MirrorPropertyBody, MirrorPropertyState, NumberItemsState,
    NumberPropState, ObjectItemsState, ObjectPropState, OwnershipBody, OwnershipState,
    PropertyBody, RelationBody, RelationState, StringItemsState, StringPropState,
};
use crate::models::calculation::CalculationPropertyBody;
use crate::types::Field;

use super::{computed_field, parse_json_string, refresh_field, to_json_string};

/// Build the wire blueprint from declarative state.
///
/// `aggregationProperties` is never emitted here: it belongs to the
/// aggregation-property sub-resource, and the lifecycle layer carries the
/// server's current map over on update.
pub fn blueprint_to_body(state: &BlueprintState) -> Result<Blueprint, ProviderError> {
    let mut schema = BlueprintSchema::default();
    if let Some(props) = &state.properties {
        build_schema(props, &mut schema)?;
    }

    let mirror_properties = if state.mirror_properties.is_empty() {
        None
    } else {
        Some(
            state
                .mirror_properties
                .iter()
                .map(|(name, m)| {
                    (
                        name.clone(),
                        MirrorPropertyBody {
                            path: m.path.clone(),
                            title: m.title.to_body().cloned(),
                        },
                    )
                })
                .collect(),
        )
    };

    let calculation_properties = if state.calculation_properties.is_empty() {
        None
    } else {
        Some(
            state
                .calculation_properties
                .iter()
                .map(|(name, c)| (name.clone(), inline_calculation_body(c)))
                .collect(),
        )
    };

    let relations = if state.relations.is_empty() {
        None
    } else {
        Some(
            state
                .relations
                .iter()
                .map(|(name, r)| {
                    (
                        name.clone(),
                        RelationBody {
                            target: r.target.clone(),
                            title: r.title.to_body().cloned(),
                            required: r.required.to_body().copied(),
                            many: r.many.to_body().copied(),
                        },
                    )
                })
                .collect(),
        )
    };

    Ok(Blueprint {
        identifier: state.identifier.clone(),
        title: state.title.to_body().cloned(),
        icon: state.icon.to_body().cloned(),
        description: state.description.to_body().cloned(),
        schema,
        mirror_properties,
        calculation_properties,
        aggregation_properties: None,
        relations,
        ownership: state.ownership.as_ref().map(|o| OwnershipBody {
            ownership_type: o.ownership_type.clone(),
            path: o.path.to_body().cloned(),
            title: o.title.to_body().cloned(),
        }),
        changelog_destination: state.changelog_destination.as_ref().map(|c| {
            ChangelogDestinationBody {
                destination_type: c.destination_type.clone(),
                url: c.url.to_body().cloned(),
                agent: c.agent.to_body().copied(),
            }
        }),
        created_at: None,
        created_by: None,
        updated_at: None,
        updated_by: None,
    })
}

/// Fold a freshly read blueprint document back into declarative state.
pub fn refresh_blueprint_state(
    state: &mut BlueprintState,
    wire: &Blueprint,
    escape_html: bool,
) -> Result<(), ProviderError> {
    state.identifier = wire.identifier.clone();
    refresh_field(&mut state.title, wire.title.as_ref());
    refresh_field(&mut state.icon, wire.icon.as_ref());
    refresh_field(&mut state.description, wire.description.as_ref());

    refresh_properties(state, wire, escape_html)?;
    refresh_mirror_properties(state, wire);
    refresh_inline_calculations(state, wire);
    refresh_relations(state, wire);

    state.ownership = wire.ownership.as_ref().map(|o| {
        let prior = state.ownership.take().unwrap_or_default();
        let mut refreshed = OwnershipState {
            ownership_type: o.ownership_type.clone(),
            ..prior
        };
        refresh_field(&mut refreshed.path, o.path.as_ref());
        refresh_field(&mut refreshed.title, o.title.as_ref());
        refreshed
    });

    state.changelog_destination = wire.changelog_destination.as_ref().map(|c| {
        let prior = state.changelog_destination.take().unwrap_or_default();
        let mut refreshed = ChangelogDestinationState {
            destination_type: c.destination_type.clone(),
            ..prior
        };
        refresh_field(&mut refreshed.url, c.url.as_ref());
        refresh_field(&mut refreshed.agent, c.agent.as_ref());
        refreshed
    });

    computed_field(&mut state.created_at, wire.created_at.as_ref());
    computed_field(&mut state.created_by, wire.created_by.as_ref());
    computed_field(&mut state.updated_at, wire.updated_at.as_ref());
    computed_field(&mut state.updated_by, wire.updated_by.as_ref());
    Ok(())
}

fn inline_calculation_body(c: &InlineCalculationState) -> CalculationPropertyBody {
    CalculationPropertyBody {
        calculation: c.calculation.clone(),
        property_type: c.property_type.clone(),
        title: c.title.to_body().cloned(),
        icon: c.icon.to_body().cloned(),
        description: c.description.to_body().cloned(),
        format: c.format.to_body().cloned(),
        colorized: c.colorized.to_body().copied(),
        colors: c.colors.to_body().cloned(),
    }
}

// -------------------------------------------------------------------------
// Declarative properties to wire schema
// -------------------------------------------------------------------------

fn build_schema(
    props: &BlueprintPropertiesState,
    schema: &mut BlueprintSchema,
) -> Result<(), ProviderError> {
    for (name, p) in &props.string_props {
        push_required(schema, name, &p.required);
        schema.properties.insert(name.clone(), string_prop_body(p));
    }
    for (name, p) in &props.number_props {
        push_required(schema, name, &p.required);
        schema.properties.insert(name.clone(), number_prop_body(p));
    }
    for (name, p) in &props.boolean_props {
        push_required(schema, name, &p.required);
        schema.properties.insert(name.clone(), boolean_prop_body(p));
    }
    for (name, p) in &props.array_props {
        push_required(schema, name, &p.required);
        schema
            .properties
            .insert(name.clone(), array_prop_body(name, p)?);
    }
    for (name, p) in &props.object_props {
        push_required(schema, name, &p.required);
        schema
            .properties
            .insert(name.clone(), object_prop_body(name, p)?);
    }
    Ok(())
}

fn push_required(schema: &mut BlueprintSchema, name: &str, required: &Field<bool>) {
    if required.as_known() == Some(&true) {
        schema.required.push(name.to_string());
    }
}

fn string_prop_body(p: &StringPropState) -> PropertyBody {
    PropertyBody {
        prop_type: "string".to_string(),
        title: p.title.to_body().cloned(),
        icon: p.icon.to_body().cloned(),
        description: p.description.to_body().cloned(),
        format: p.format.to_body().cloned(),
        pattern: p.pattern.to_body().cloned(),
        default: p.default.to_body().map(|v| Value::String(v.clone())),
        enums: p
            .enums
            .to_body()
            .map(|vs| vs.iter().cloned().map(Value::String).collect()),
        enum_colors: p.enum_colors.to_body().cloned(),
        min_length: p.min_length.to_body().copied(),
        max_length: p.max_length.to_body().copied(),
        ..Default::default()
    }
}

fn number_prop_body(p: &NumberPropState) -> PropertyBody {
    PropertyBody {
        prop_type: "number".to_string(),
        title: p.title.to_body().cloned(),
        icon: p.icon.to_body().cloned(),
        description: p.description.to_body().cloned(),
        default: p.default.to_body().map(|v| number_value(*v)),
        enums: p
            .enums
            .to_body()
            .map(|vs| vs.iter().map(|v| number_value(*v)).collect()),
        enum_colors: p.enum_colors.to_body().cloned(),
        minimum: p.minimum.to_body().copied(),
        maximum: p.maximum.to_body().copied(),
        ..Default::default()
    }
}

fn boolean_prop_body(p: &BooleanPropState) -> PropertyBody {
    PropertyBody {
        prop_type: "boolean".to_string(),
        title: p.title.to_body().cloned(),
        icon: p.icon.to_body().cloned(),
        description: p.description.to_body().cloned(),
        default: p.default.to_body().map(|v| Value::Bool(*v)),
        ..Default::default()
    }
}

fn array_prop_body(name: &str, p: &ArrayPropState) -> Result<PropertyBody, ProviderError> {
    let items = match (
        &p.string_items,
        &p.number_items,
        &p.boolean_items,
        &p.object_items,
    ) {
        (Some(items), None, None, None) => Some(string_items_value(items)),
        (None, Some(items), None, None) => Some(number_items_value(items)),
        (None, None, Some(items), None) => Some(boolean_items_value(items)),
        (None, None, None, Some(items)) => Some(object_items_value(name, items)?),
        (None, None, None, None) => None,
        _ => {
            return Err(ProviderError::Validation(format!(
                "array property {name} declares more than one items type"
            )))
        },
    };

    Ok(PropertyBody {
        prop_type: "array".to_string(),
        title: p.title.to_body().cloned(),
        icon: p.icon.to_body().cloned(),
        description: p.description.to_body().cloned(),
        min_items: p.min_items.to_body().copied(),
        max_items: p.max_items.to_body().copied(),
        items,
        ..Default::default()
    })
}

fn object_prop_body(name: &str, p: &ObjectPropState) -> Result<PropertyBody, ProviderError> {
    let default = p
        .default
        .to_body()
        .map(|raw| parse_json_string(raw, &format!("object property {name} default")))
        .transpose()?;
    Ok(PropertyBody {
        prop_type: "object".to_string(),
        title: p.title.to_body().cloned(),
        icon: p.icon.to_body().cloned(),
        description: p.description.to_body().cloned(),
        default,
        spec: p.spec.to_body().cloned(),
        ..Default::default()
    })
}

fn number_value(v: f64) -> Value {
    serde_json::Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

fn string_items_value(items: &StringItemsState) -> Value {
    let mut out = serde_json::Map::new();
    out.insert("type".to_string(), Value::String("string".to_string()));
    if let Some(format) = items.format.to_body() {
        out.insert("format".to_string(), Value::String(format.clone()));
    }
    if let Some(default) = items.default.to_body() {
        out.insert(
            "default".to_string(),
            Value::Array(default.iter().cloned().map(Value::String).collect()),
        );
    }
    Value::Object(out)
}

fn number_items_value(items: &NumberItemsState) -> Value {
    let mut out = serde_json::Map::new();
    out.insert("type".to_string(), Value::String("number".to_string()));
    if let Some(default) = items.default.to_body() {
        out.insert(
            "default".to_string(),
            Value::Array(default.iter().map(|v| number_value(*v)).collect()),
        );
    }
    Value::Object(out)
}

fn boolean_items_value(items: &BooleanItemsState) -> Value {
    let mut out = serde_json::Map::new();
    out.insert("type".to_string(), Value::String("boolean".to_string()));
    if let Some(default) = items.default.to_body() {
        out.insert(
            "default".to_string(),
            Value::Array(default.iter().copied().map(Value::Bool).collect()),
        );
    }
    Value::Object(out)
}

fn object_items_value(name: &str, items: &ObjectItemsState) -> Result<Value, ProviderError> {
    let mut out = serde_json::Map::new();
    out.insert("type".to_string(), Value::String("object".to_string()));
    if let Some(default) = items.default.to_body() {
        let parsed = default
            .iter()
            .map(|raw| parse_json_string(raw, &format!("array property {name} object default")))
            .collect::<Result<Vec<_>, _>>()?;
        out.insert("default".to_string(), Value::Array(parsed));
    }
    Ok(Value::Object(out))
}

// -------------------------------------------------------------------------
// Wire schema back to declarative properties
// -------------------------------------------------------------------------

fn refresh_properties(
    state: &mut BlueprintState,
    wire: &Blueprint,
    escape_html: bool,
) -> Result<(), ProviderError> {
    if wire.schema.properties.is_empty() {
        if state.properties.is_some() {
            state.properties = Some(BlueprintPropertiesState::default());
        }
        return Ok(());
    }

    let prior = state.properties.take().unwrap_or_default();
    let mut next = BlueprintPropertiesState::default();
    let required: Vec<&str> = wire.schema.required.iter().map(String::as_str).collect();

    for (name, body) in &wire.schema.properties {
        let is_required = required.contains(&name.as_str());
        match body.prop_type.as_str() {
            "string" => {
                let mut p = prior.string_props.get(name).cloned().unwrap_or_default();
                refresh_string_prop(&mut p, body, is_required);
                next.string_props.insert(name.clone(), p);
            },
            "number" => {
                let mut p = prior.number_props.get(name).cloned().unwrap_or_default();
                refresh_number_prop(&mut p, body, is_required);
                next.number_props.insert(name.clone(), p);
            },
            "boolean" => {
                let mut p = prior.boolean_props.get(name).cloned().unwrap_or_default();
                refresh_boolean_prop(&mut p, body, is_required);
                next.boolean_props.insert(name.clone(), p);
            },
            "array" => {
                let mut p = prior.array_props.get(name).cloned().unwrap_or_default();
                refresh_array_prop(&mut p, body, is_required, escape_html)?;
                next.array_props.insert(name.clone(), p);
            },
            "object" => {
                let mut p = prior.object_props.get(name).cloned().unwrap_or_default();
                refresh_object_prop(&mut p, body, is_required, escape_html)?;
                next.object_props.insert(name.clone(), p);
            },
            other => {
                return Err(ProviderError::Validation(format!(
                    "property {name} has unsupported type {other}"
                )))
            },
        }
    }
    state.properties = Some(next);
    Ok(())
}

fn mark_required(required_field: &mut Field<bool>, is_required: bool) {
    // The wire carries required-ness in a separate list, so a user who left
    // the flag unset still gets a concrete value back when the server set it.
    if is_required {
        *required_field = Field::Known(true);
    } else if required_field.is_known() {
        *required_field = Field::Known(false);
    }
}

fn refresh_string_prop(p: &mut StringPropState, body: &PropertyBody, is_required: bool) {
    refresh_field(&mut p.title, body.title.as_ref());
    refresh_field(&mut p.icon, body.icon.as_ref());
    refresh_field(&mut p.description, body.description.as_ref());
    refresh_field(&mut p.format, body.format.as_ref());
    refresh_field(&mut p.pattern, body.pattern.as_ref());
    let default = body.default.as_ref().and_then(Value::as_str).map(str::to_string);
    refresh_field(&mut p.default, default.as_ref());
    let enums = body.enums.as_ref().map(|vs| {
        vs.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect::<Vec<_>>()
    });
    refresh_field(&mut p.enums, enums.as_ref());
    refresh_field(&mut p.enum_colors, body.enum_colors.as_ref());
    refresh_field(&mut p.min_length, body.min_length.as_ref());
    refresh_field(&mut p.max_length, body.max_length.as_ref());
    mark_required(&mut p.required, is_required);
}

fn refresh_number_prop(p: &mut NumberPropState, body: &PropertyBody, is_required: bool) {
    refresh_field(&mut p.title, body.title.as_ref());
    refresh_field(&mut p.icon, body.icon.as_ref());
    refresh_field(&mut p.description, body.description.as_ref());
    let default = body.default.as_ref().and_then(Value::as_f64);
    refresh_field(&mut p.default, default.as_ref());
    let enums = body
        .enums
        .as_ref()
        .map(|vs| vs.iter().filter_map(Value::as_f64).collect::<Vec<_>>());
    refresh_field(&mut p.enums, enums.as_ref());
    refresh_field(&mut p.enum_colors, body.enum_colors.as_ref());
    refresh_field(&mut p.minimum, body.minimum.as_ref());
    refresh_field(&mut p.maximum, body.maximum.as_ref());
    mark_required(&mut p.required, is_required);
}

fn refresh_boolean_prop(p: &mut BooleanPropState, body: &PropertyBody, is_required: bool) {
    refresh_field(&mut p.title, body.title.as_ref());
    refresh_field(&mut p.icon, body.icon.as_ref());
    refresh_field(&mut p.description, body.description.as_ref());
    let default = body.default.as_ref().and_then(Value::as_bool);
    refresh_field(&mut p.default, default.as_ref());
    mark_required(&mut p.required, is_required);
}

fn refresh_array_prop(
    p: &mut ArrayPropState,
    body: &PropertyBody,
    is_required: bool,
    escape_html: bool,
) -> Result<(), ProviderError> {
    refresh_field(&mut p.title, body.title.as_ref());
    refresh_field(&mut p.icon, body.icon.as_ref());
    refresh_field(&mut p.description, body.description.as_ref());
    refresh_field(&mut p.min_items, body.min_items.as_ref());
    refresh_field(&mut p.max_items, body.max_items.as_ref());
    mark_required(&mut p.required, is_required);

    let Some(items) = &body.items else {
        p.string_items = None;
        p.number_items = None;
        p.boolean_items = None;
        p.object_items = None;
        return Ok(());
    };
    let item_type = items.get("type").and_then(Value::as_str).unwrap_or("string");
    let defaults = items.get("default").and_then(Value::as_array);

    p.string_items = None;
    p.number_items = None;
    p.boolean_items = None;
    p.object_items = None;
    match item_type {
        "string" => {
            let mut s = StringItemsState::default();
            let format = items.get("format").and_then(Value::as_str).map(str::to_string);
            refresh_field(&mut s.format, format.as_ref());
            if let Some(vals) = defaults {
                s.default = Field::Known(
                    vals.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                );
            }
            p.string_items = Some(s);
        },
        "number" => {
            let mut s = NumberItemsState::default();
            if let Some(vals) = defaults {
                s.default = Field::Known(vals.iter().filter_map(Value::as_f64).collect());
            }
            p.number_items = Some(s);
        },
        "boolean" => {
            let mut s = BooleanItemsState::default();
            if let Some(vals) = defaults {
                s.default = Field::Known(vals.iter().filter_map(Value::as_bool).collect());
            }
            p.boolean_items = Some(s);
        },
        "object" => {
            let mut s = ObjectItemsState::default();
            if let Some(vals) = defaults {
                let rendered = vals
                    .iter()
                    .map(|v| to_json_string(v, escape_html))
                    .collect::<Result<Vec<_>, _>>()?;
                s.default = Field::Known(rendered);
            }
            p.object_items = Some(s);
        },
        _ => {},
    }
    Ok(())
}

fn refresh_object_prop(
    p: &mut ObjectPropState,
    body: &PropertyBody,
    is_required: bool,
    escape_html: bool,
) -> Result<(), ProviderError> {
    refresh_field(&mut p.title, body.title.as_ref());
    refresh_field(&mut p.icon, body.icon.as_ref());
    refresh_field(&mut p.description, body.description.as_ref());
    refresh_field(&mut p.spec, body.spec.as_ref());
    let default = body
        .default
        .as_ref()
        .map(|v| to_json_string(v, escape_html))
        .transpose()?;
    refresh_field(&mut p.default, default.as_ref());
    mark_required(&mut p.required, is_required);
    Ok(())
}

fn refresh_mirror_properties(state: &mut BlueprintState, wire: &Blueprint) {
    let prior = std::mem::take(&mut state.mirror_properties);
    let mut next = BTreeMap::new();
    for (name, body) in wire.mirror_properties.iter().flatten() {
        let mut m = prior.get(name).cloned().unwrap_or_default();
        m.path = body.path.clone();
        refresh_field(&mut m.title, body.title.as_ref());
        next.insert(name.clone(), m);
    }
    state.mirror_properties = next;
}

fn refresh_inline_calculations(state: &mut BlueprintState, wire: &Blueprint) {
    let prior = std::mem::take(&mut state.calculation_properties);
    let mut next = BTreeMap::new();
    for (name, body) in wire.calculation_properties.iter().flatten() {
        let mut c = prior.get(name).cloned().unwrap_or_default();
        c.calculation = body.calculation.clone();
        c.property_type = body.property_type.clone();
        refresh_field(&mut c.title, body.title.as_ref());
        refresh_field(&mut c.icon, body.icon.as_ref());
        refresh_field(&mut c.description, body.description.as_ref());
        refresh_field(&mut c.format, body.format.as_ref());
        refresh_field(&mut c.colorized, body.colorized.as_ref());
        refresh_field(&mut c.colors, body.colors.as_ref());
        next.insert(name.clone(), c);
    }
    state.calculation_properties = next;
}

fn refresh_relations(state: &mut BlueprintState, wire: &Blueprint) {
    let prior = std::mem::take(&mut state.relations);
    let mut next = BTreeMap::new();
    for (name, body) in wire.relations.iter().flatten() {
        let mut r = prior.get(name).cloned().unwrap_or_else(|| RelationState {
            target: body.target.clone(),
            ..Default::default()
        });
        r.target = body.target.clone();
        refresh_field(&mut r.title, body.title.as_ref());
        refresh_field(&mut r.required, body.required.as_ref());
        refresh_field(&mut r.many, body.many.as_ref());
        next.insert(name.clone(), r);
    }
    state.relations = next;
}
