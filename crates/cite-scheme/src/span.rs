/*
 * span.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Citation spans.

use crate::citation::{CitationEntry, CitationSpan};
use crate::registry::SchemeRegistry;

/// Separator between the two ends of a span in text form.
pub const SPAN_SEPARATOR: &str = " - ";

/// Replace every one-sided span with its bare citation.
pub fn compact_citations(entries: Vec<CitationEntry>) -> Vec<CitationEntry> {
    entries.into_iter().map(CitationEntry::compact).collect()
}

impl SchemeRegistry {
    /// Parse `"A - B"` into a span.
    ///
    /// Fails unless the text has exactly one separator and `A` parses. `B`
    /// is parsed on its own; if it does not parse the span has no end.
    pub fn parse_span(&self, text: &str, default_scheme_id: Option<&str>) -> Option<CitationSpan> {
        self.parse_span_with(text, SPAN_SEPARATOR, default_scheme_id)
    }

    /// [`parse_span`](Self::parse_span) with a custom separator, e.g. `-`
    /// for shelf mark ranges such as `1r-3v`.
    pub fn parse_span_with(
        &self,
        text: &str,
        separator: &str,
        default_scheme_id: Option<&str>,
    ) -> Option<CitationSpan> {
        let parts: Vec<&str> = text.split(separator).collect();
        let [first, second] = parts.as_slice() else {
            return None;
        };
        let a = self
            .parse(first, default_scheme_id)
            .filter(|c| !c.is_empty())?;
        // without a prefix of its own, B belongs to A's scheme
        let b = self
            .parse(second, Some(a.scheme_id.as_str()))
            .filter(|c| !c.is_empty());
        Some(CitationSpan::new(a, b))
    }

    /// Parse text that is either a span or a single citation.
    pub fn parse_entry(&self, text: &str, default_scheme_id: Option<&str>) -> Option<CitationEntry> {
        if text.contains(SPAN_SEPARATOR) {
            return self.parse_span(text, default_scheme_id).map(CitationEntry::Span);
        }
        self.parse(text, default_scheme_id)
            .filter(|c| !c.is_empty())
            .map(CitationEntry::Citation)
    }

    /// Render a span as `A - B`, or just `A` without an end.
    pub fn span_to_string(&self, span: &CitationSpan) -> Option<String> {
        let a = self.render(&span.a)?;
        match &span.b {
            Some(b) => Some(format!("{}{}{}", a, SPAN_SEPARATOR, self.render(b)?)),
            None => Some(a),
        }
    }

    /// Render a working-set entry.
    pub fn entry_to_string(&self, entry: &CitationEntry) -> Option<String> {
        match entry {
            CitationEntry::Citation(citation) => self.render(citation),
            CitationEntry::Span(span) => self.span_to_string(span),
        }
    }
}
