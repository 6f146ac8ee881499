/*
 * pattern.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compiled scheme patterns.
//!
//! Every regular expression a scheme uses (path pattern, suffix patterns,
//! masks, range suffix rules and `~` clause values) is compiled once when
//! the scheme set is configured. Parsing and validation look the compiled
//! regex up by its source text.

use std::borrow::Cow;
use std::collections::HashMap;

use regex::Regex;

use crate::error::{Result, SchemeError};
use crate::scheme::{CitationScheme, ClauseOperator, StepDomain};

/// Regexes compiled from one scheme, keyed by pattern text.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    compiled: HashMap<String, Regex>,
}

impl PatternSet {
    /// Compile every pattern `scheme` uses. The first pattern that does not
    /// compile is reported as [`SchemeError::InvalidPattern`].
    pub fn for_scheme(scheme: &CitationScheme) -> Result<Self> {
        let mut set = Self::default();
        set.add(scheme, &scheme.text_options.path_pattern)?;

        for definition in scheme.steps.values() {
            if let Some(pattern) = &definition.suffix_pattern {
                set.add(scheme, pattern)?;
            }
            let domains = std::iter::once(&definition.domain)
                .chain(definition.conditions.iter().map(|c| &c.domain));
            for domain in domains {
                match domain {
                    StepDomain::Mask(Some(mask)) => set.add(scheme, mask)?,
                    StepDomain::Range(range) => {
                        if let Some(suffix) = &range.suffix {
                            set.add(scheme, suffix)?;
                        }
                    }
                    _ => {}
                }
            }
            let clauses = definition.conditions.iter().flat_map(|c| &c.clauses);
            for clause in clauses.filter(|c| c.op == ClauseOperator::Matches) {
                set.add(scheme, &clause.value)?;
            }
        }
        Ok(set)
    }

    fn add(&mut self, scheme: &CitationScheme, pattern: &str) -> Result<()> {
        if self.compiled.contains_key(pattern) {
            return Ok(());
        }
        let re = Regex::new(pattern).map_err(|err| SchemeError::InvalidPattern {
            scheme: scheme.id.clone(),
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        self.compiled.insert(pattern.to_string(), re);
        Ok(())
    }

    /// Whether `pattern` was compiled up front.
    pub fn contains(&self, pattern: &str) -> bool {
        self.compiled.contains_key(pattern)
    }

    /// The regex for `pattern`.
    ///
    /// Patterns outside the set (schemes that never went through a
    /// registry) are compiled on the spot; one that does not compile logs a
    /// warning and yields `None`.
    pub fn get(&self, pattern: &str) -> Option<Cow<'_, Regex>> {
        if let Some(re) = self.compiled.get(pattern) {
            return Some(Cow::Borrowed(re));
        }
        match Regex::new(pattern) {
            Ok(re) => Some(Cow::Owned(re)),
            Err(err) => {
                tracing::warn!(pattern, error = %err, "Invalid pattern");
                None
            }
        }
    }
}
