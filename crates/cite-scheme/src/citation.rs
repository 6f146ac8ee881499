/*
 * citation.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Citation values.
//!
//! Citations and spans are plain values: they carry no identity beyond
//! their content and are freely cloned and compared.

use serde::{Deserialize, Serialize};

/// The value of one step of a citation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValue {
    pub step_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Display text, as parsed or entered.
    #[serde(default)]
    pub value: String,

    /// Resolved number: the 1-based set position for set steps, the numeric
    /// value for numeric steps, absent for text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,

    /// Key of the formatter used for `n`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl StepValue {
    pub fn new(step_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_n(mut self, n: i32) -> Self {
        self.n = Some(n);
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// The suffix, treating an empty string as no suffix.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref().filter(|s| !s.is_empty())
    }
}

/// A citation: a scheme id plus its step values in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub scheme_id: String,
    #[serde(default)]
    pub steps: Vec<StepValue>,
}

impl Citation {
    pub fn new(scheme_id: impl Into<String>, steps: Vec<StepValue>) -> Self {
        Self {
            scheme_id: scheme_id.into(),
            steps,
        }
    }

    /// A citation with no steps, i.e. unparsed text.
    pub fn empty(scheme_id: impl Into<String>) -> Self {
        Self::new(scheme_id, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The scheme id, or `default_scheme_id` when the citation has none.
    pub fn scheme_id_or<'a>(&'a self, default_scheme_id: &'a str) -> &'a str {
        if self.scheme_id.is_empty() {
            default_scheme_id
        } else {
            &self.scheme_id
        }
    }
}

/// An inclusive range between two citations.
///
/// A span without `b` means exactly the same as its bare `a`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationSpan {
    pub a: Citation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<Citation>,
}

impl CitationSpan {
    pub fn new(a: Citation, b: Option<Citation>) -> Self {
        Self { a, b }
    }

    pub fn is_range(&self) -> bool {
        self.b.is_some()
    }
}

/// An element of a working set: a bare citation or a span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CitationEntry {
    Span(CitationSpan),
    Citation(Citation),
}

impl CitationEntry {
    /// The citation the entry starts with.
    pub fn first(&self) -> &Citation {
        match self {
            CitationEntry::Citation(c) => c,
            CitationEntry::Span(span) => &span.a,
        }
    }

    /// The end of the range, if the entry is a two-sided span.
    pub fn last(&self) -> Option<&Citation> {
        match self {
            CitationEntry::Citation(_) => None,
            CitationEntry::Span(span) => span.b.as_ref(),
        }
    }

    /// Replace a one-sided span with its bare citation.
    pub fn compact(self) -> Self {
        match self {
            CitationEntry::Span(span) if !span.is_range() => CitationEntry::Citation(span.a),
            other => other,
        }
    }
}

impl From<Citation> for CitationEntry {
    fn from(citation: Citation) -> Self {
        CitationEntry::Citation(citation)
    }
}

impl From<CitationSpan> for CitationEntry {
    fn from(span: CitationSpan) -> Self {
        CitationEntry::Span(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_suffix_is_no_suffix() {
        let step = StepValue::new("verso", "12").with_n(12).with_suffix("");
        assert_eq!(step.suffix(), None);
        let step = step.with_suffix("a");
        assert_eq!(step.suffix(), Some("a"));
    }

    #[test]
    fn test_scheme_id_fallback() {
        assert_eq!(Citation::empty("").scheme_id_or("dc"), "dc");
        assert_eq!(Citation::empty("od").scheme_id_or("dc"), "od");
    }

    #[test]
    fn test_entry_json_shapes() {
        let citation = Citation::new("dc", vec![StepValue::new("cantica", "If.").with_n(1)]);
        let json = serde_json::to_string(&CitationEntry::from(citation.clone())).unwrap();
        assert_eq!(
            json,
            r#"{"schemeId":"dc","steps":[{"stepId":"cantica","value":"If.","n":1}]}"#
        );

        let span: CitationEntry =
            serde_json::from_str(&format!(r#"{{"a":{}}}"#, json)).unwrap();
        assert_eq!(span, CitationEntry::Span(CitationSpan::new(citation, None)));
    }

    #[test]
    fn test_compact_one_sided_span() {
        let a = Citation::empty("dc");
        let entry = CitationEntry::Span(CitationSpan::new(a.clone(), None));
        assert_eq!(entry.compact(), CitationEntry::Citation(a.clone()));

        let span = CitationSpan::new(a.clone(), Some(a.clone()));
        assert_eq!(
            CitationEntry::Span(span.clone()).compact(),
            CitationEntry::Span(span)
        );
    }
}
