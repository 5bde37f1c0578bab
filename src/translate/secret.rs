//! Organization secret translation.
//!
//! Reads never return the secret value, so refresh leaves the declared
//! value untouched instead of clearing it.

use crate::models::secret::{OrganizationSecret, OrganizationSecretState};
use crate::types::Field;

use super::refresh_field;

/// Build the wire secret from declarative state.
pub fn organization_secret_to_body(state: &OrganizationSecretState) -> OrganizationSecret {
    OrganizationSecret {
        secret_name: state.secret_name.clone(),
        secret_value: Some(state.secret_value.clone()),
        description: state.description.clone(),
    }
}

/// Fold a freshly read secret document back into declarative state.
pub fn refresh_organization_secret_state(
    state: &mut OrganizationSecretState,
    wire: &OrganizationSecret,
) {
    state.secret_name = wire.secret_name.clone();
    if let Some(value) = &wire.secret_value {
        state.secret_value = value.clone();
    }
    refresh_field(&mut state.description, wire.description.as_known());
}

/// A description that goes from set to unset must be cleared on the server;
/// the PATCH body carries an explicit null in that case.
pub fn description_cleared(prior: &Field<String>, planned: &Field<String>) -> bool {
    prior.is_known() && !planned.is_known()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_keeps_value_when_server_omits_it() {
        let mut state = OrganizationSecretState {
            secret_name: "slack-token".to_string(),
            secret_value: "xoxb-1".to_string(),
            description: Field::Known("Bot token".to_string()),
        };
        let wire = OrganizationSecret {
            secret_name: "slack-token".to_string(),
            secret_value: None,
            description: Field::Known("Bot token".to_string()),
        };
        refresh_organization_secret_state(&mut state, &wire);
        assert_eq!(state.secret_value, "xoxb-1");
        assert_eq!(state.description, Field::Known("Bot token".to_string()));
    }

    #[test]
    fn test_refresh_clears_description_absent_on_server() {
        let mut state = OrganizationSecretState {
            secret_name: "slack-token".to_string(),
            secret_value: "xoxb-1".to_string(),
            description: Field::Known("stale".to_string()),
        };
        let wire = OrganizationSecret {
            secret_name: "slack-token".to_string(),
            secret_value: None,
            description: Field::Unset,
        };
        refresh_organization_secret_state(&mut state, &wire);
        assert_eq!(state.description, Field::Null);
    }

    #[test]
    fn test_description_cleared_transition() {
        assert!(description_cleared(
            &Field::Known("old".to_string()),
            &Field::Null
        ));
        assert!(!description_cleared(&Field::Unset, &Field::Null));
        assert!(!description_cleared(
            &Field::Known("old".to_string()),
            &Field::Known("new".to_string())
        ));
    }
}
