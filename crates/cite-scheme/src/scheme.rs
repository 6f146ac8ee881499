/*
 * scheme.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Scheme definitions.
//!
//! A scheme is immutable configuration: an ordered path of step names, the
//! text grammar used to parse and render citations, and one
//! [`StepDefinition`] per step. Schemes are loaded as part of a
//! [`SchemeSettings`](crate::SchemeSettings) set and never mutated afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A named citation scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationScheme {
    /// Scheme id. When loaded from a settings map, the map key wins.
    #[serde(default)]
    pub id: String,

    /// Human readable name.
    pub name: String,

    /// Step names, in citation order.
    pub path: Vec<String>,

    /// Steps from this one onward may be omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_from: Option<String>,

    /// Display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Text grammar.
    pub text_options: SchemeTextOptions,

    /// Step definitions keyed by step name.
    pub steps: IndexMap<String, StepDefinition>,
}

impl CitationScheme {
    /// Position of a step in the path.
    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.path.iter().position(|s| s == step_id)
    }

    /// Number of leading steps every citation of this scheme must carry.
    pub fn required_step_count(&self) -> usize {
        self.optional_from
            .as_deref()
            .and_then(|step| self.step_index(step))
            .unwrap_or(self.path.len())
    }

    /// Step definition by name.
    pub fn step(&self, step_id: &str) -> Option<&StepDefinition> {
        self.steps.get(step_id)
    }
}

/// Text grammar of a scheme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeTextOptions {
    /// Regular expression matching a whole citation; one capture group per
    /// path step, either positional or named after the step.
    pub path_pattern: String,

    /// Render template with `{step}` placeholders.
    pub template: String,

    /// Key of the parser registered for this scheme; the default parser
    /// is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser_key: Option<String>,

    /// Usage hint shown to editors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Kind of value a step holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// One of a closed set of strings; the value is its 1-based position.
    Set,
    /// A number, optionally formatted and suffixed.
    Numeric,
    /// Free text.
    Text,
    /// Text constrained by a mask pattern.
    Masked,
}

/// Definition of one step of a scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    #[serde(rename = "type")]
    pub kind: StepKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Number formatter key for numeric steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Regex matching a trailing suffix on numeric values (e.g. `[a-z]$`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix_pattern: Option<String>,

    /// Domain used when no condition matches.
    #[serde(default)]
    pub domain: StepDomain,

    /// Domain overrides, evaluated in declaration order, first match wins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<StepCondition>,
}

/// Legal values of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepDomain {
    /// Closed set of strings; position (1-based) is the numeric value.
    Set(Vec<String>),
    /// Numeric range.
    Range(NumericRange),
    /// Free or masked text; the optional pattern validates the whole value.
    Mask(Option<String>),
}

impl Default for StepDomain {
    fn default() -> Self {
        StepDomain::Mask(None)
    }
}

impl StepDomain {
    /// 1-based position of a value in a set domain.
    pub fn set_position(&self, value: &str) -> Option<i32> {
        match self {
            StepDomain::Set(items) => items
                .iter()
                .position(|item| item == value)
                .and_then(|i| i32::try_from(i + 1).ok()),
            _ => None,
        }
    }
}

/// Numeric range with optional bounds and suffix rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
    /// Regex every suffix must match; suffixes are rejected when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl NumericRange {
    pub fn new(min: Option<i32>, max: Option<i32>) -> Self {
        Self {
            min,
            max,
            suffix: None,
        }
    }

    pub fn contains(&self, n: i32) -> bool {
        self.min.is_none_or(|min| n >= min) && self.max.is_none_or(|max| n <= max)
    }
}

/// A domain override applying when all its clauses match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepCondition {
    pub clauses: Vec<StepClause>,
    pub domain: StepDomain,
}

/// One comparison against a preceding step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepClause {
    /// Step the clause is about.
    #[serde(rename = "id")]
    pub step_id: String,
    pub op: ClauseOperator,
    pub value: String,
    /// Suffix used by the numeric operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

/// Clause comparison operator.
///
/// Unrecognized operators are kept as [`ClauseOperator::Unknown`] and never
/// match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClauseOperator {
    /// `=`: string equality.
    Equal,
    /// `!=`: string inequality.
    NotEqual,
    /// `~`: regex match.
    Matches,
    /// `==`: numeric equality.
    NumEqual,
    /// `<>`: numeric inequality.
    NumNotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    Unknown(String),
}

impl ClauseOperator {
    pub fn as_str(&self) -> &str {
        match self {
            ClauseOperator::Equal => "=",
            ClauseOperator::NotEqual => "!=",
            ClauseOperator::Matches => "~",
            ClauseOperator::NumEqual => "==",
            ClauseOperator::NumNotEqual => "<>",
            ClauseOperator::Less => "<",
            ClauseOperator::Greater => ">",
            ClauseOperator::LessOrEqual => "<=",
            ClauseOperator::GreaterOrEqual => ">=",
            ClauseOperator::Unknown(op) => op,
        }
    }
}

impl From<String> for ClauseOperator {
    fn from(op: String) -> Self {
        match op.as_str() {
            "=" => ClauseOperator::Equal,
            "!=" => ClauseOperator::NotEqual,
            "~" => ClauseOperator::Matches,
            "==" => ClauseOperator::NumEqual,
            "<>" => ClauseOperator::NumNotEqual,
            "<" => ClauseOperator::Less,
            ">" => ClauseOperator::Greater,
            "<=" => ClauseOperator::LessOrEqual,
            ">=" => ClauseOperator::GreaterOrEqual,
            _ => ClauseOperator::Unknown(op),
        }
    }
}

impl From<ClauseOperator> for String {
    fn from(op: ClauseOperator) -> Self {
        op.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_definition_from_json() {
        let json = r#"{
            "type": "numeric",
            "format": "roman",
            "domain": { "range": { "min": 1, "max": 33 } },
            "conditions": [
                {
                    "clauses": [{ "id": "cantica", "op": "=", "value": "If." }],
                    "domain": { "range": { "min": 1, "max": 34 } }
                }
            ]
        }"#;
        let step: StepDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(step.kind, StepKind::Numeric);
        assert_eq!(step.format.as_deref(), Some("roman"));
        assert_eq!(
            step.domain,
            StepDomain::Range(NumericRange::new(Some(1), Some(33)))
        );
        assert_eq!(step.conditions.len(), 1);
        assert_eq!(step.conditions[0].clauses[0].op, ClauseOperator::Equal);
        assert_eq!(step.conditions[0].clauses[0].step_id, "cantica");
    }

    #[test]
    fn test_missing_domain_is_free_text() {
        let step: StepDefinition = serde_json::from_str(r#"{ "type": "text" }"#).unwrap();
        assert_eq!(step.domain, StepDomain::Mask(None));
        assert!(step.conditions.is_empty());
    }

    #[test]
    fn test_unknown_operator_survives_round_trip() {
        let clause: StepClause =
            serde_json::from_str(r#"{ "id": "a", "op": "=~", "value": "x" }"#).unwrap();
        assert_eq!(clause.op, ClauseOperator::Unknown("=~".to_string()));
        let json = serde_json::to_string(&clause).unwrap();
        assert!(json.contains(r#""op":"=~""#), "Got: {}", json);
    }

    #[test]
    fn test_set_position_is_one_based() {
        let domain = StepDomain::Set(vec!["If.".into(), "Purg.".into(), "Par.".into()]);
        assert_eq!(domain.set_position("If."), Some(1));
        assert_eq!(domain.set_position("Par."), Some(3));
        assert_eq!(domain.set_position("Inf."), None);
        assert_eq!(StepDomain::default().set_position("If."), None);
    }

    #[test]
    fn test_range_contains_open_bounds() {
        assert!(NumericRange::new(Some(1), None).contains(10_000));
        assert!(!NumericRange::new(Some(1), None).contains(0));
        assert!(NumericRange::new(None, Some(5)).contains(-3));
        assert!(!NumericRange::new(None, Some(5)).contains(6));
    }
}
