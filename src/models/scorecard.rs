//! Scorecard models: rule sets evaluated against entities of a blueprint.

use serde::{Deserialize, Serialize};

use crate::types::Field;

/// Declarative scorecard state. Scorecards are addressed through their
/// blueprint, so the resource ID is the composite `blueprint:scorecard`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScorecardState {
    pub identifier: String,
    /// Blueprint whose entities the scorecard evaluates.
    pub blueprint: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ScorecardRuleState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ScorecardQueryState>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub levels: Field<Vec<ScorecardLevelState>>,

    // Server-computed
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_at: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_by: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated_at: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated_by: Field<String>,
}

/// One scorecard rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScorecardRuleState {
    pub identifier: String,
    pub title: String,
    /// Level awarded when the rule passes.
    pub level: String,
    pub query: ScorecardQueryState,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
}

/// A rule or filter query: combinator plus conditions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScorecardQueryState {
    /// `and` or `or`.
    pub combinator: String,
    /// Conditions as opaque JSON strings.
    pub conditions: Vec<String>,
}

/// A scorecard level with its display colour.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScorecardLevelState {
    pub title: String,
    pub color: String,
}

/// The scorecard document as the API reads and writes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<String>,
    #[serde(default)]
    pub rules: Vec<ScorecardRuleBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ScorecardQueryBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<ScorecardLevelBody>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Wire form of one rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScorecardRuleBody {
    pub identifier: String,
    pub title: String,
    pub level: String,
    pub query: ScorecardQueryBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Wire form of a query; conditions are parsed JSON trees.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScorecardQueryBody {
    pub combinator: String,
    pub conditions: Vec<serde_json::Value>,
}

/// Wire form of one level.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScorecardLevelBody {
    pub title: String,
    pub color: String,
}
