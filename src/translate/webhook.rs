//! Webhook translation.

use crate::error::ProviderError;
use crate::models::webhook::{
    Webhook, WebhookEntityMappingBody, WebhookEntityMappingState, WebhookMappingBody,
    WebhookMappingState, WebhookSecurityBody, WebhookSecurityState, WebhookState,
};

use super::{computed_field, parse_json_string, refresh_field, to_json_string, value_from_wire, value_to_wire};

/// Build the wire webhook from declarative state.
pub fn webhook_to_body(state: &WebhookState) -> Result<Webhook, ProviderError> {
    let security = state.security.as_ref().map(|s| WebhookSecurityBody {
        secret: s.secret.to_body().cloned(),
        signature_header_name: s.signature_header_name.to_body().cloned(),
        signature_algorithm: s.signature_algorithm.to_body().cloned(),
        signature_prefix: s.signature_prefix.to_body().cloned(),
        request_identifier_path: s.request_identifier_path.to_body().cloned(),
    });

    let mappings = if state.mappings.is_empty() {
        None
    } else {
        Some(
            state
                .mappings
                .iter()
                .map(mapping_body)
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    Ok(Webhook {
        identifier: state.identifier.clone(),
        title: state.title.to_body().cloned(),
        icon: state.icon.to_body().cloned(),
        description: state.description.to_body().cloned(),
        enabled: state.enabled.to_body().copied(),
        security,
        mappings,
        url: None,
        webhook_key: None,
        created_at: None,
        created_by: None,
        updated_at: None,
        updated_by: None,
    })
}

/// Fold a freshly read webhook document back into declarative state.
pub fn refresh_webhook_state(
    state: &mut WebhookState,
    wire: &Webhook,
    escape_html: bool,
) -> Result<(), ProviderError> {
    state.identifier = wire.identifier.clone();
    refresh_field(&mut state.title, wire.title.as_ref());
    refresh_field(&mut state.icon, wire.icon.as_ref());
    refresh_field(&mut state.description, wire.description.as_ref());
    refresh_field(&mut state.enabled, wire.enabled.as_ref());

    if let Some(body) = &wire.security {
        let s = state.security.get_or_insert_with(WebhookSecurityState::default);
        refresh_field(&mut s.secret, body.secret.as_ref());
        refresh_field(&mut s.signature_header_name, body.signature_header_name.as_ref());
        refresh_field(&mut s.signature_algorithm, body.signature_algorithm.as_ref());
        refresh_field(&mut s.signature_prefix, body.signature_prefix.as_ref());
        refresh_field(
            &mut s.request_identifier_path,
            body.request_identifier_path.as_ref(),
        );
    }

    if let Some(bodies) = &wire.mappings {
        let prior = std::mem::take(&mut state.mappings);
        state.mappings = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                let existing = prior.get(i).cloned().unwrap_or_default();
                mapping_state(existing, body, escape_html)
            })
            .collect::<Result<Vec<_>, _>>()?;
    }

    computed_field(&mut state.url, wire.url.as_ref());
    computed_field(&mut state.webhook_key, wire.webhook_key.as_ref());
    computed_field(&mut state.created_at, wire.created_at.as_ref());
    computed_field(&mut state.created_by, wire.created_by.as_ref());
    computed_field(&mut state.updated_at, wire.updated_at.as_ref());
    computed_field(&mut state.updated_by, wire.updated_by.as_ref());
    Ok(())
}

fn mapping_body(m: &WebhookMappingState) -> Result<WebhookMappingBody, ProviderError> {
    Ok(WebhookMappingBody {
        blueprint: m.blueprint.clone(),
        filter: m.filter.to_body().cloned(),
        items_to_parse: m.items_to_parse.to_body().cloned(),
        operation: m.operation.to_body().map(|raw| value_to_wire(raw)),
        entity: WebhookEntityMappingBody {
            identifier: m.entity.identifier.clone(),
            title: m.entity.title.to_body().cloned(),
            icon: m.entity.icon.to_body().cloned(),
            team: m.entity.team.to_body().cloned(),
            properties: m
                .entity
                .properties
                .to_body()
                .map(|raw| parse_json_string(raw, "mapping properties"))
                .transpose()?,
            relations: m
                .entity
                .relations
                .to_body()
                .map(|raw| parse_json_string(raw, "mapping relations"))
                .transpose()?,
        },
    })
}

fn mapping_state(
    mut prior: WebhookMappingState,
    body: &WebhookMappingBody,
    escape_html: bool,
) -> Result<WebhookMappingState, ProviderError> {
    prior.blueprint = body.blueprint.clone();
    refresh_field(&mut prior.filter, body.filter.as_ref());
    refresh_field(&mut prior.items_to_parse, body.items_to_parse.as_ref());
    let operation = body.operation.as_ref().map(value_from_wire);
    refresh_field(&mut prior.operation, operation.as_ref());

    let mut entity = WebhookEntityMappingState {
        identifier: body.entity.identifier.clone(),
        ..prior.entity
    };
    refresh_field(&mut entity.title, body.entity.title.as_ref());
    refresh_field(&mut entity.icon, body.entity.icon.as_ref());
    refresh_field(&mut entity.team, body.entity.team.as_ref());
    let properties = body
        .entity
        .properties
        .as_ref()
        .map(|v| to_json_string(v, escape_html))
        .transpose()?;
    refresh_field(&mut entity.properties, properties.as_ref());
    let relations = body
        .entity
        .relations
        .as_ref()
        .map(|v| to_json_string(v, escape_html))
        .transpose()?;
    refresh_field(&mut entity.relations, relations.as_ref());
    prior.entity = entity;
    Ok(prior)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    fn sample_state() -> WebhookState {
        WebhookState {
            identifier: "github-ingest".to_string(),
            enabled: Field::Known(true),
            mappings: vec![WebhookMappingState {
                blueprint: "repo".to_string(),
                filter: Field::Known(".headers.event == \"push\"".to_string()),
                entity: WebhookEntityMappingState {
                    identifier: ".body.repository.name".to_string(),
                    properties: Field::Known(
                        r#"{"stars":".body.repository.stargazers_count"}"#.to_string(),
                    ),
                    ..Default::default()
                },
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_round_trip_preserves_mappings() {
        let state = sample_state();
        let wire = webhook_to_body(&state).unwrap();
        assert_eq!(wire.mappings.as_ref().unwrap().len(), 1);

        let mut refreshed = sample_state();
        refresh_webhook_state(&mut refreshed, &wire, true).unwrap();
        assert_eq!(refreshed.mappings[0].blueprint, "repo");
        assert_eq!(
            refreshed.mappings[0].entity.properties,
            Field::Known(r#"{"stars":".body.repository.stargazers_count"}"#.to_string())
        );
    }

    #[test]
    fn test_server_computed_url_and_key() {
        let mut state = sample_state();
        let mut wire = webhook_to_body(&state).unwrap();
        wire.url = Some("https://ingest.getport.io/hooks/abc".to_string());
        wire.webhook_key = Some("abc".to_string());

        refresh_webhook_state(&mut state, &wire, true).unwrap();
        assert_eq!(state.webhook_key, Field::Known("abc".to_string()));
        assert!(state.url.is_known());
    }
}
