/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Declarative citation schemes.
//!
//! A scheme describes how a short textual citation such as `If. XXVI 112`
//! (Dante, *Inferno* 26, line 112) or `α 112` (*Odyssey* 1, line 112)
//! breaks down into an ordered sequence of typed steps. This crate:
//!
//! - parses citation text into a [`Citation`] and renders it back
//! - formats step numbers as Roman numerals, label tables or decimals
//! - resolves the legal values of a step from the steps before it
//!   ("canto 26 of *Inferno* has only 142 lines")
//! - orders citations and builds [`CitationSpan`] ranges
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       SchemeRegistry                         │
//! │   active scheme set · formatters · parsers (by string key)   │
//! └──────┬─────────────────┬──────────────────┬──────────────────┘
//!        │                 │                  │
//!        ▼                 ▼                  ▼
//!  CitationParser    NumberFormatter    domain resolution
//!  (text ⇄ steps)   (n ⇄ display text)  (conditions, clauses)
//! ```
//!
//! Ordering ([`compare_citations`], [`sort_citations`]) and span compaction
//! ([`compact_citations`]) are plain functions over citation values.
//!
//! # Example
//!
//! ```rust
//! use cite_scheme::{SchemeRegistry, SchemeSettings};
//!
//! let json = r#"{
//!   "schemes": {
//!     "dc": {
//!       "name": "Divina Commedia",
//!       "path": ["cantica", "canto", "verso"],
//!       "optionalFrom": "canto",
//!       "textOptions": {
//!         "pathPattern": "^(If\\.|Purg\\.|Par\\.)(?:\\s+([IVXLC]+))?(?:\\s+(\\d+))?$",
//!         "template": "{cantica} {canto} {verso}"
//!       },
//!       "steps": {
//!         "cantica": { "type": "set", "domain": { "set": ["If.", "Purg.", "Par."] } },
//!         "canto": { "type": "numeric", "format": "roman", "domain": { "range": { "min": 1, "max": 34 } } },
//!         "verso": { "type": "numeric", "domain": { "range": { "min": 1 } } }
//!       }
//!     }
//!   }
//! }"#;
//!
//! let registry = SchemeRegistry::with_settings(SchemeSettings::from_json(json)?)?;
//! let citation = registry.parse("If. XXVI 112", Some("dc")).unwrap();
//! assert_eq!(citation.steps[0].n, Some(1));
//! assert_eq!(citation.steps[1].n, Some(26));
//! assert_eq!(registry.render(&citation).as_deref(), Some("If. XXVI 112"));
//! assert!(registry.validate_citation(&citation, None).is_empty());
//! # Ok::<(), cite_scheme::SchemeError>(())
//! ```

pub mod citation;
pub mod compare;
pub mod condition;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod parser;
pub mod pattern;
pub mod registry;
pub mod scheme;
pub mod settings;
pub mod span;

pub use citation::{Citation, CitationEntry, CitationSpan, StepValue};
pub use compare::{
    compare_citations, compare_entries, compare_optional, compare_suffixed, sort_citations,
};
pub use condition::match_clause;
pub use domain::{StepViolation, StepViolationKind, resolve_step_domain};
pub use error::{Result, SchemeError};
pub use formatter::{
    ArabicNumberFormatter, FormatterRegistry, MappedNumberFormatter, NumberFormatter,
    ParsedNumber, ROMAN_FORMAT, ROMAN_LOWER_FORMAT, RomanNumberFormatter,
};
pub use parser::{CitationParser, ParseContext, PatternCitationParser};
pub use pattern::PatternSet;
pub use registry::{DEFAULT_PARSER_KEY, SchemePrefix, SchemeRegistry, extract_scheme_id};
pub use scheme::{
    CitationScheme, ClauseOperator, NumericRange, SchemeTextOptions, StepClause, StepCondition,
    StepDefinition, StepDomain, StepKind,
};
pub use settings::{MemorySettingsStore, SchemeSettings, SettingsStore};
pub use span::{SPAN_SEPARATOR, compact_citations};
