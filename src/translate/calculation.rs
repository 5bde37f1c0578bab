//! Calculation property translation.

use crate::error::ProviderError;
use crate::models::calculation::{CalculationPropertyBody, CalculationPropertyState};

use super::refresh_field;

/// Build the wire body for one calculation property.
pub fn calculation_property_to_body(
    state: &CalculationPropertyState,
) -> Result<CalculationPropertyBody, ProviderError> {
    Ok(CalculationPropertyBody {
        calculation: state.calculation.clone(),
        property_type: state.property_type.clone(),
        title: state.title.to_body().cloned(),
        icon: state.icon.to_body().cloned(),
        description: state.description.to_body().cloned(),
        format: state.format.to_body().cloned(),
        colorized: state.colorized.to_body().copied(),
        colors: state.colors.to_body().cloned(),
    })
}

/// Fold a freshly read calculation body back into declarative state.
pub fn refresh_calculation_property_state(
    state: &mut CalculationPropertyState,
    wire: &CalculationPropertyBody,
) {
    state.calculation = wire.calculation.clone();
    state.property_type = wire.property_type.clone();
    refresh_field(&mut state.title, wire.title.as_ref());
    refresh_field(&mut state.icon, wire.icon.as_ref());
    refresh_field(&mut state.description, wire.description.as_ref());
    refresh_field(&mut state.format, wire.format.as_ref());
    refresh_field(&mut state.colorized, wire.colorized.as_ref());
    refresh_field(&mut state.colors, wire.colors.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    #[test]
    fn test_round_trip() {
        let mut state = CalculationPropertyState {
            blueprint_identifier: "svc".to_string(),
            calculation_identifier: "doubled".to_string(),
            calculation: ".props.cpu * 2".to_string(),
            property_type: "number".to_string(),
            title: Field::Known("Doubled CPU".to_string()),
            ..Default::default()
        };
        let wire = calculation_property_to_body(&state).unwrap();
        assert_eq!(wire.calculation, ".props.cpu * 2");

        refresh_calculation_property_state(&mut state, &wire);
        assert_eq!(state.title, Field::Known("Doubled CPU".to_string()));
        assert!(state.icon.is_unset());
    }
}
