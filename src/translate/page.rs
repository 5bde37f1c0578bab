//! Page translation: widgets travel as opaque JSON strings on the
//! declarative side.

use crate::error::ProviderError;
use crate::models::page::{Page, PageState};

use super::{computed_field, parse_json_string, refresh_field, to_json_string};

/// Build the wire page from declarative state.
pub fn page_to_body(state: &PageState) -> Result<Page, ProviderError> {
    let widgets = state
        .widgets
        .to_body()
        .map(|raws| {
            raws.iter()
                .enumerate()
                .map(|(i, raw)| parse_json_string(raw, &format!("widget {i}")))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    Ok(Page {
        identifier: state.identifier.clone(),
        page_type: Some(state.page_type.clone()),
        title: state.title.to_body().cloned(),
        icon: state.icon.to_body().cloned(),
        locked: state.locked.to_body().copied(),
        blueprint: state.blueprint.to_body().cloned(),
        after: state.after.to_body().cloned(),
        parent: state.parent.to_body().cloned(),
        widgets,
        created_at: None,
        created_by: None,
        updated_at: None,
        updated_by: None,
    })
}

/// Fold a freshly read page document back into declarative state.
pub fn refresh_page_state(
    state: &mut PageState,
    wire: &Page,
    escape_html: bool,
) -> Result<(), ProviderError> {
    state.identifier = wire.identifier.clone();
    if let Some(page_type) = &wire.page_type {
        state.page_type = page_type.clone();
    }
    refresh_field(&mut state.title, wire.title.as_ref());
    refresh_field(&mut state.icon, wire.icon.as_ref());
    refresh_field(&mut state.locked, wire.locked.as_ref());
    refresh_field(&mut state.blueprint, wire.blueprint.as_ref());
    refresh_field(&mut state.after, wire.after.as_ref());
    refresh_field(&mut state.parent, wire.parent.as_ref());

    let widgets = wire
        .widgets
        .as_ref()
        .map(|vs| {
            vs.iter()
                .map(|v| to_json_string(v, escape_html))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;
    refresh_field(&mut state.widgets, widgets.as_ref());

    computed_field(&mut state.created_at, wire.created_at.as_ref());
    computed_field(&mut state.created_by, wire.created_by.as_ref());
    computed_field(&mut state.updated_at, wire.updated_at.as_ref());
    computed_field(&mut state.updated_by, wire.updated_by.as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    fn sample_state() -> PageState {
        PageState {
            identifier: "microservices".to_string(),
            page_type: "blueprint-entities".to_string(),
            blueprint: Field::Known("svc".to_string()),
            widgets: Field::Known(vec![
                r#"{"dataset":{},"type":"table-entities-explorer"}"#.to_string(),
            ]),
            ..Default::default()
        }
    }

    #[test]
    fn test_widgets_parse_to_trees() {
        let wire = page_to_body(&sample_state()).unwrap();
        let widgets = wire.widgets.unwrap();
        assert_eq!(widgets[0]["type"], "table-entities-explorer");
    }

    #[test]
    fn test_round_trip_preserves_widgets() {
        let state = sample_state();
        let wire = page_to_body(&state).unwrap();

        let mut refreshed = sample_state();
        refresh_page_state(&mut refreshed, &wire, true).unwrap();
        assert_eq!(refreshed.widgets, state.widgets);
        assert_eq!(refreshed.blueprint, Field::Known("svc".to_string()));
    }

    #[test]
    fn test_invalid_widget_rejected() {
        let mut state = sample_state();
        state.widgets = Field::Known(vec!["{broken".to_string()]);
        let err = page_to_body(&state).unwrap_err();
        assert!(err.to_string().contains("widget 0"));
    }
}
