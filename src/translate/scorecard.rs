//! Scorecard translation.

use crate::error::ProviderError;
use crate::models::scorecard::{
    Scorecard, ScorecardLevelBody, ScorecardLevelState, ScorecardQueryBody, ScorecardQueryState,
    ScorecardRuleBody, ScorecardRuleState, ScorecardState,
};
use crate::types::Field;

use super::{computed_field, parse_json_string, refresh_field, to_json_string};

/// Build the wire scorecard from declarative state.
pub fn scorecard_to_body(state: &ScorecardState) -> Result<Scorecard, ProviderError> {
    let rules = state
        .rules
        .iter()
        .map(rule_body)
        .collect::<Result<Vec<_>, _>>()?;
    let filter = state.filter.as_ref().map(query_body).transpose()?;
    let levels = state.levels.to_body().map(|levels| {
        levels
            .iter()
            .map(|l| ScorecardLevelBody {
                title: l.title.clone(),
                color: l.color.clone(),
            })
            .collect()
    });

    Ok(Scorecard {
        identifier: state.identifier.clone(),
        title: Some(state.title.clone()),
        blueprint: None,
        rules,
        filter,
        levels,
        created_at: None,
        created_by: None,
        updated_at: None,
        updated_by: None,
    })
}

/// Fold a freshly read scorecard document back into declarative state.
pub fn refresh_scorecard_state(
    state: &mut ScorecardState,
    wire: &Scorecard,
    escape_html: bool,
) -> Result<(), ProviderError> {
    state.identifier = wire.identifier.clone();
    if let Some(title) = &wire.title {
        state.title = title.clone();
    }
    if let Some(blueprint) = &wire.blueprint {
        state.blueprint = blueprint.clone();
    }

    state.rules = wire
        .rules
        .iter()
        .map(|body| rule_state(body, escape_html))
        .collect::<Result<Vec<_>, _>>()?;
    state.filter = wire
        .filter
        .as_ref()
        .map(|body| query_state(body, escape_html))
        .transpose()?;
    let levels = wire.levels.as_ref().map(|levels| {
        levels
            .iter()
            .map(|l| ScorecardLevelState {
                title: l.title.clone(),
                color: l.color.clone(),
            })
            .collect::<Vec<_>>()
    });
    refresh_field(&mut state.levels, levels.as_ref());

    computed_field(&mut state.created_at, wire.created_at.as_ref());
    computed_field(&mut state.created_by, wire.created_by.as_ref());
    computed_field(&mut state.updated_at, wire.updated_at.as_ref());
    computed_field(&mut state.updated_by, wire.updated_by.as_ref());
    Ok(())
}

fn rule_body(rule: &ScorecardRuleState) -> Result<ScorecardRuleBody, ProviderError> {
    Ok(ScorecardRuleBody {
        identifier: rule.identifier.clone(),
        title: rule.title.clone(),
        level: rule.level.clone(),
        query: query_body(&rule.query)?,
        description: rule.description.to_body().cloned(),
    })
}

fn query_body(query: &ScorecardQueryState) -> Result<ScorecardQueryBody, ProviderError> {
    let conditions = query
        .conditions
        .iter()
        .enumerate()
        .map(|(i, raw)| parse_json_string(raw, &format!("rule condition {i}")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ScorecardQueryBody {
        combinator: query.combinator.clone(),
        conditions,
    })
}

fn rule_state(body: &ScorecardRuleBody, escape_html: bool) -> Result<ScorecardRuleState, ProviderError> {
    Ok(ScorecardRuleState {
        identifier: body.identifier.clone(),
        title: body.title.clone(),
        level: body.level.clone(),
        query: query_state(&body.query, escape_html)?,
        description: Field::from_server(body.description.clone()),
    })
}

fn query_state(body: &ScorecardQueryBody, escape_html: bool) -> Result<ScorecardQueryState, ProviderError> {
    let conditions = body
        .conditions
        .iter()
        .map(|v| to_json_string(v, escape_html))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ScorecardQueryState {
        combinator: body.combinator.clone(),
        conditions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> ScorecardState {
        ScorecardState {
            identifier: "readiness".to_string(),
            blueprint: "svc".to_string(),
            title: "Production readiness".to_string(),
            rules: vec![ScorecardRuleState {
                identifier: "has-oncall".to_string(),
                title: "Has on-call".to_string(),
                level: "Gold".to_string(),
                query: ScorecardQueryState {
                    combinator: "and".to_string(),
                    conditions: vec![
                        r#"{"operator":"isNotEmpty","property":"oncall"}"#.to_string(),
                    ],
                },
                description: Field::Unset,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_conditions_parse_to_trees() {
        let wire = scorecard_to_body(&sample_state()).unwrap();
        assert_eq!(wire.rules[0].query.conditions[0]["operator"], "isNotEmpty");
    }

    #[test]
    fn test_round_trip_preserves_rules() {
        let state = sample_state();
        let wire = scorecard_to_body(&state).unwrap();

        let mut refreshed = sample_state();
        refresh_scorecard_state(&mut refreshed, &wire, true).unwrap();

        assert_eq!(refreshed.rules.len(), 1);
        assert_eq!(refreshed.rules[0].level, "Gold");
        assert_eq!(
            refreshed.rules[0].query.conditions[0],
            r#"{"operator":"isNotEmpty","property":"oncall"}"#
        );
    }

    #[test]
    fn test_invalid_condition_rejected() {
        let mut state = sample_state();
        state.rules[0].query.conditions = vec!["{broken".to_string()];
        let err = scorecard_to_body(&state).unwrap_err();
        assert!(err.to_string().contains("condition 0"));
    }
}
