/*
 * domain.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conditional domain resolution and step validation.
//!
//! The effective domain of a step depends on the values already chosen for
//! the citation: conditions are tried in declaration order against the
//! citation steps from the first one on, and the first condition whose
//! clauses all match supplies the domain.

use std::fmt;

use serde::Serialize;

use crate::citation::{Citation, StepValue};
use crate::condition::match_clauses;
use crate::pattern::PatternSet;
use crate::scheme::{CitationScheme, NumericRange, StepDefinition, StepDomain};

/// The domain of `definition` given the citation steps in `steps`.
pub fn resolve_step_domain<'a>(
    definition: &'a StepDefinition,
    steps: &[StepValue],
    patterns: &PatternSet,
) -> &'a StepDomain {
    if definition.conditions.is_empty() || steps.is_empty() {
        return &definition.domain;
    }
    definition
        .conditions
        .iter()
        .find(|condition| match_clauses(&condition.clauses, steps, patterns))
        .map_or(&definition.domain, |condition| &condition.domain)
}

/// Why a step value falls outside its domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StepViolationKind {
    /// A required step is missing from the citation.
    Missing,
    /// The scheme defines no such step.
    UnknownStep,
    /// The step is not at its path position.
    OutOfOrder { expected: String },
    /// The value is blank.
    Empty,
    NotInSet,
    /// A numeric step without a resolved number.
    NotANumber,
    BelowMinimum { min: i32 },
    AboveMaximum { max: i32 },
    InvalidSuffix { suffix: String },
    MaskMismatch { mask: String },
}

/// A step value rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepViolation {
    pub step_id: String,
    #[serde(flatten)]
    pub kind: StepViolationKind,
}

impl StepViolation {
    fn new(step_id: &str, kind: StepViolationKind) -> Self {
        Self {
            step_id: step_id.to_string(),
            kind,
        }
    }
}

impl fmt::Display for StepViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = &self.step_id;
        match &self.kind {
            StepViolationKind::Missing => write!(f, "{}: required step is missing", step),
            StepViolationKind::UnknownStep => write!(f, "{}: not a step of this scheme", step),
            StepViolationKind::OutOfOrder { expected } => {
                write!(f, "{}: found where '{}' was expected", step, expected)
            }
            StepViolationKind::Empty => write!(f, "{}: value is empty", step),
            StepViolationKind::NotInSet => write!(f, "{}: value is not one of the allowed values", step),
            StepViolationKind::NotANumber => write!(f, "{}: value is not a number", step),
            StepViolationKind::BelowMinimum { min } => write!(f, "{}: value is below {}", step, min),
            StepViolationKind::AboveMaximum { max } => write!(f, "{}: value is above {}", step, max),
            StepViolationKind::InvalidSuffix { suffix } => {
                write!(f, "{}: suffix '{}' is not allowed", step, suffix)
            }
            StepViolationKind::MaskMismatch { mask } => {
                write!(f, "{}: value does not match '{}'", step, mask)
            }
        }
    }
}

/// Validate a citation against its scheme.
///
/// Every step is checked against the domain resolved from the steps before
/// it. Validation stops at the first step that is out of place, since
/// later steps cannot be resolved against the path.
pub fn validate_citation(
    scheme: &CitationScheme,
    citation: &Citation,
    patterns: &PatternSet,
) -> Vec<StepViolation> {
    let mut violations = Vec::new();

    for (i, step) in citation.steps.iter().enumerate() {
        let Some(definition) = scheme.step(&step.step_id) else {
            violations.push(StepViolation::new(&step.step_id, StepViolationKind::UnknownStep));
            return violations;
        };
        match scheme.path.get(i) {
            Some(expected) if expected == &step.step_id => {}
            Some(expected) => {
                violations.push(StepViolation::new(
                    &step.step_id,
                    StepViolationKind::OutOfOrder {
                        expected: expected.clone(),
                    },
                ));
                return violations;
            }
            None => {
                violations.push(StepViolation::new(&step.step_id, StepViolationKind::UnknownStep));
                return violations;
            }
        }

        let domain = resolve_step_domain(definition, &citation.steps[..i], patterns);
        if let Some(kind) = check_value(step, domain, patterns) {
            violations.push(StepViolation::new(&step.step_id, kind));
        }
    }

    for missing in scheme
        .path
        .iter()
        .take(scheme.required_step_count())
        .skip(citation.steps.len())
    {
        violations.push(StepViolation::new(missing, StepViolationKind::Missing));
    }
    violations
}

fn check_value(step: &StepValue, domain: &StepDomain, patterns: &PatternSet) -> Option<StepViolationKind> {
    if step.value.trim().is_empty() {
        return Some(StepViolationKind::Empty);
    }
    match domain {
        StepDomain::Set(items) => (!items.contains(&step.value)).then_some(StepViolationKind::NotInSet),
        StepDomain::Range(range) => check_range(step, range, patterns),
        StepDomain::Mask(None) => None,
        // an uncompilable mask has already been warned about
        StepDomain::Mask(Some(mask)) => patterns
            .get(mask)
            .is_some_and(|re| !re.is_match(&step.value))
            .then(|| StepViolationKind::MaskMismatch { mask: mask.clone() }),
    }
}

fn check_range(step: &StepValue, range: &NumericRange, patterns: &PatternSet) -> Option<StepViolationKind> {
    let Some(n) = step.n else {
        return Some(StepViolationKind::NotANumber);
    };
    if !range.contains(n) {
        let below = range
            .min
            .filter(|min| n < *min)
            .map(|min| StepViolationKind::BelowMinimum { min });
        return below.or_else(|| range.max.map(|max| StepViolationKind::AboveMaximum { max }));
    }
    let suffix = step.suffix()?;
    let allowed = range
        .suffix
        .as_deref()
        .and_then(|pattern| patterns.get(pattern))
        .is_some_and(|re| re.is_match(suffix));
    (!allowed).then(|| StepViolationKind::InvalidSuffix {
        suffix: suffix.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::{ClauseOperator, StepClause, StepCondition, StepKind};

    fn clause(step_id: &str, op: &str, value: &str) -> StepClause {
        StepClause {
            step_id: step_id.to_string(),
            op: ClauseOperator::from(op.to_string()),
            value: value.to_string(),
            suffix: None,
        }
    }

    fn verso() -> StepDefinition {
        StepDefinition {
            kind: StepKind::Numeric,
            color: None,
            format: None,
            suffix_pattern: None,
            domain: StepDomain::Range(NumericRange::new(Some(1), Some(160))),
            conditions: vec![
                StepCondition {
                    clauses: vec![clause("cantica", "=", "If."), clause("canto", "==", "26")],
                    domain: StepDomain::Range(NumericRange::new(Some(1), Some(142))),
                },
                StepCondition {
                    clauses: vec![clause("cantica", "=", "If.")],
                    domain: StepDomain::Range(NumericRange::new(Some(1), Some(150))),
                },
            ],
        }
    }

    fn steps(cantica: &str, canto: i32) -> Vec<StepValue> {
        vec![
            StepValue::new("cantica", cantica),
            StepValue::new("canto", canto.to_string()).with_n(canto),
        ]
    }

    fn max_of(domain: &StepDomain) -> Option<i32> {
        match domain {
            StepDomain::Range(range) => range.max,
            _ => None,
        }
    }

    #[test]
    fn test_first_matching_condition_wins() {
        let def = verso();
        let patterns = PatternSet::default();
        assert_eq!(max_of(resolve_step_domain(&def, &steps("If.", 26), &patterns)), Some(142));
        assert_eq!(max_of(resolve_step_domain(&def, &steps("If.", 25), &patterns)), Some(150));
    }

    #[test]
    fn test_no_match_falls_back_to_default() {
        let def = verso();
        let patterns = PatternSet::default();
        assert_eq!(max_of(resolve_step_domain(&def, &steps("Par.", 26), &patterns)), Some(160));
        assert_eq!(max_of(resolve_step_domain(&def, &[], &patterns)), Some(160));
    }

    #[test]
    fn test_check_range_suffix() {
        let patterns = PatternSet::default();
        let mut range = NumericRange::new(Some(1), None);
        let step = StepValue::new("folio", "3v").with_n(3).with_suffix("v");
        assert_eq!(
            check_range(&step, &range, &patterns),
            Some(StepViolationKind::InvalidSuffix {
                suffix: "v".to_string()
            })
        );
        range.suffix = Some("^[rv]$".to_string());
        assert_eq!(check_range(&step, &range, &patterns), None);
        let zero = StepValue::new("folio", "0").with_n(0);
        assert_eq!(
            check_range(&zero, &range, &patterns),
            Some(StepViolationKind::BelowMinimum { min: 1 })
        );
    }

    #[test]
    fn test_check_range_bounds() {
        let patterns = PatternSet::default();
        let range = NumericRange::new(Some(1), Some(142));
        let line = |n: i32| StepValue::new("verso", n.to_string()).with_n(n);
        assert_eq!(check_range(&line(1), &range, &patterns), None);
        assert_eq!(check_range(&line(142), &range, &patterns), None);
        assert_eq!(
            check_range(&line(143), &range, &patterns),
            Some(StepViolationKind::AboveMaximum { max: 142 })
        );
        assert_eq!(
            check_range(&StepValue::new("verso", "x"), &range, &patterns),
            Some(StepViolationKind::NotANumber)
        );
    }

    #[test]
    fn test_check_mask_and_set() {
        let patterns = PatternSet::default();
        let mask = StepDomain::Mask(Some("^[a-z]+$".to_string()));
        assert_eq!(check_value(&StepValue::new("w", "abc"), &mask, &patterns), None);
        assert!(matches!(
            check_value(&StepValue::new("w", "ab1"), &mask, &patterns),
            Some(StepViolationKind::MaskMismatch { .. })
        ));
        let set = StepDomain::Set(vec!["If.".to_string()]);
        assert_eq!(
            check_value(&StepValue::new("cantica", "Inf."), &set, &patterns),
            Some(StepViolationKind::NotInSet)
        );
        assert_eq!(
            check_value(&StepValue::new("cantica", " "), &set, &patterns),
            Some(StepViolationKind::Empty)
        );
    }

    #[test]
    fn test_violation_display() {
        let v = StepViolation::new("verso", StepViolationKind::AboveMaximum { max: 142 });
        assert_eq!(v.to_string(), "verso: value is above 142");
    }
}
