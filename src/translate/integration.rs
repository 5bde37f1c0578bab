//! Integration translation.

use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::models::integration::{Integration, IntegrationState};

use super::{computed_field, parse_json_string, refresh_field, to_json_string};

/// Build the wire integration from declarative state.
pub fn integration_to_body(state: &IntegrationState) -> Result<Integration, ProviderError> {
    let config = state
        .config
        .to_body()
        .map(|raw| parse_json_string(raw, "integration config"))
        .transpose()?;

    let changelog_destination = if state.kafka_changelog_destination == Some(true) {
        Some(json!({"type": "KAFKA"}))
    } else if let Some(url) = state.webhook_changelog_destination_url.to_body() {
        let mut out = serde_json::Map::new();
        out.insert("type".to_string(), Value::String("WEBHOOK".to_string()));
        out.insert("url".to_string(), Value::String(url.clone()));
        if let Some(agent) = state.webhook_changelog_destination_agent.to_body() {
            out.insert("agent".to_string(), Value::Bool(*agent));
        }
        Some(Value::Object(out))
    } else {
        None
    };

    Ok(Integration {
        installation_id: state.installation_id.clone(),
        title: state.title.to_body().cloned(),
        installation_app_type: state.installation_app_type.to_body().cloned(),
        version: state.version.to_body().cloned(),
        config,
        changelog_destination,
        created_at: None,
        updated_at: None,
    })
}

/// Fold a freshly read integration document back into declarative state.
pub fn refresh_integration_state(
    state: &mut IntegrationState,
    wire: &Integration,
    escape_html: bool,
) -> Result<(), ProviderError> {
    state.installation_id = wire.installation_id.clone();
    refresh_field(&mut state.title, wire.title.as_ref());
    refresh_field(
        &mut state.installation_app_type,
        wire.installation_app_type.as_ref(),
    );
    refresh_field(&mut state.version, wire.version.as_ref());
    let config = wire
        .config
        .as_ref()
        .map(|v| to_json_string(v, escape_html))
        .transpose()?;
    refresh_field(&mut state.config, config.as_ref());

    if let Some(destination) = &wire.changelog_destination {
        match destination.get("type").and_then(Value::as_str) {
            Some("KAFKA") => {
                state.kafka_changelog_destination = Some(true);
                state.webhook_changelog_destination_url = crate::types::Field::Unset;
            },
            Some("WEBHOOK") => {
                state.kafka_changelog_destination = None;
                let url = destination
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                refresh_field(&mut state.webhook_changelog_destination_url, url.as_ref());
                let agent = destination.get("agent").and_then(Value::as_bool);
                refresh_field(
                    &mut state.webhook_changelog_destination_agent,
                    agent.as_ref(),
                );
            },
            _ => {},
        }
    }

    computed_field(&mut state.created_at, wire.created_at.as_ref());
    computed_field(&mut state.updated_at, wire.updated_at.as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    #[test]
    fn test_kafka_destination() {
        let state = IntegrationState {
            installation_id: "github-main".to_string(),
            kafka_changelog_destination: Some(true),
            ..Default::default()
        };
        let wire = integration_to_body(&state).unwrap();
        assert_eq!(wire.changelog_destination.unwrap()["type"], "KAFKA");
    }

    #[test]
    fn test_webhook_destination_round_trip() {
        let mut state = IntegrationState {
            installation_id: "github-main".to_string(),
            webhook_changelog_destination_url: Field::Known("https://cl.example.com".to_string()),
            config: Field::Known(r#"{"resources":[]}"#.to_string()),
            ..Default::default()
        };
        let wire = integration_to_body(&state).unwrap();
        assert_eq!(wire.changelog_destination.as_ref().unwrap()["type"], "WEBHOOK");

        refresh_integration_state(&mut state, &wire, true).unwrap();
        assert_eq!(
            state.webhook_changelog_destination_url,
            Field::Known("https://cl.example.com".to_string())
        );
        assert_eq!(state.config, Field::Known(r#"{"resources":[]}"#.to_string()));
    }
}
