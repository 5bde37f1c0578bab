//! Team translation.

use serde_json::Value;

use crate::models::team::{Team, TeamState};

use super::{computed_field, refresh_field};

/// Build the wire team from declarative state. Users are sent as plain
/// email strings.
pub fn team_to_body(state: &TeamState) -> Team {
    Team {
        name: state.name.clone(),
        description: state.description.to_body().cloned(),
        users: state
            .users
            .to_body()
            .map(|users| users.iter().cloned().map(Value::String).collect()),
        provider: None,
        created_at: None,
        updated_at: None,
    }
}

/// Fold a freshly read team document back into declarative state. Reads
/// return users as objects, so emails are extracted first.
pub fn refresh_team_state(state: &mut TeamState, wire: &Team) {
    state.name = wire.name.clone();
    refresh_field(&mut state.description, wire.description.as_ref());
    let users = wire.users.as_ref().map(|_| wire.user_emails());
    refresh_field(&mut state.users, users.as_ref());

    computed_field(&mut state.provider, wire.provider.as_ref());
    computed_field(&mut state.created_at, wire.created_at.as_ref());
    computed_field(&mut state.updated_at, wire.updated_at.as_ref());
}
