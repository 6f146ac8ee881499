/*
 * condition.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Clause matching for conditional step domains.

use std::cmp::Ordering;

use crate::citation::StepValue;
use crate::compare::compare_suffixed;
use crate::pattern::PatternSet;
use crate::scheme::{ClauseOperator, StepClause};

/// Whether `step` satisfies `clause`.
///
/// `=`, `!=` and `~` look at the raw step text. The numeric operators
/// compare `(n, suffix)` pairs and never match a step without a number or
/// a clause value that is not a number. Unknown operators never match.
/// `~` patterns are taken from `patterns`.
pub fn match_clause(step: &StepValue, clause: &StepClause, patterns: &PatternSet) -> bool {
    match &clause.op {
        ClauseOperator::Equal => step.value == clause.value,
        ClauseOperator::NotEqual => step.value != clause.value,
        ClauseOperator::Matches => patterns
            .get(&clause.value)
            .is_some_and(|re| re.is_match(&step.value)),
        ClauseOperator::Unknown(op) => {
            tracing::warn!(op = %op, step = %clause.step_id, "Unknown clause operator");
            false
        }
        numeric => {
            let (Some(n), Ok(value)) = (step.n, clause.value.trim().parse::<i32>()) else {
                return false;
            };
            let ord = compare_suffixed(
                Some(n),
                step.suffix(),
                Some(value),
                clause.suffix.as_deref(),
            );
            match numeric {
                ClauseOperator::NumEqual => ord == Ordering::Equal,
                ClauseOperator::NumNotEqual => ord != Ordering::Equal,
                ClauseOperator::Less => ord == Ordering::Less,
                ClauseOperator::Greater => ord == Ordering::Greater,
                ClauseOperator::LessOrEqual => ord != Ordering::Greater,
                ClauseOperator::GreaterOrEqual => ord != Ordering::Less,
                _ => false,
            }
        }
    }
}

/// Whether every clause matches the step at the same position, starting
/// from the first step.
pub fn match_clauses(clauses: &[StepClause], steps: &[StepValue], patterns: &PatternSet) -> bool {
    clauses.len() <= steps.len()
        && clauses
            .iter()
            .zip(steps)
            .all(|(clause, step)| match_clause(step, clause, patterns))
}
