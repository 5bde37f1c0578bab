//! Folder translation.

use crate::models::folder::{Folder, FolderState};

use super::refresh_field;

/// Build the wire folder from declarative state.
pub fn folder_to_body(state: &FolderState) -> Folder {
    Folder {
        identifier: state.identifier.clone(),
        title: state.title.to_body().cloned(),
        after: state.after.to_body().cloned(),
        parent: state.parent.to_body().cloned(),
        sidebar_type: None,
    }
}

/// Fold a freshly read folder item back into declarative state.
pub fn refresh_folder_state(state: &mut FolderState, wire: &Folder) {
    state.identifier = wire.identifier.clone();
    refresh_field(&mut state.title, wire.title.as_ref());
    refresh_field(&mut state.after, wire.after.as_ref());
    refresh_field(&mut state.parent, wire.parent.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    #[test]
    fn test_round_trip() {
        let mut state = FolderState {
            identifier: "infra".to_string(),
            title: Field::Known("Infrastructure".to_string()),
            sidebar: Field::Known("catalog".to_string()),
            ..Default::default()
        };
        let wire = folder_to_body(&state);
        assert_eq!(wire.identifier, "infra");

        refresh_folder_state(&mut state, &wire);
        assert_eq!(state.title, Field::Known("Infrastructure".to_string()));
        // The sidebar is addressing, not document content
        assert_eq!(state.sidebar, Field::Known("catalog".to_string()));
    }
}
