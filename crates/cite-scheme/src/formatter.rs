/*
 * formatter.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Number formatters.
//!
//! A formatter converts a step number to display text and back. Formatters
//! are stateless once built and shared behind `Arc` between schemes.
//!
//! Built-in keys:
//! - `roman`: upper-case Roman numerals
//! - `roman-lower`: lower-case Roman numerals
//!
//! Numeric steps without a format key use [`ArabicNumberFormatter`].

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;

/// Formatter key for upper-case Roman numerals.
pub const ROMAN_FORMAT: &str = "roman";

/// Formatter key for lower-case Roman numerals.
pub const ROMAN_LOWER_FORMAT: &str = "roman-lower";

/// A number parsed from step text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedNumber {
    pub n: i32,
    pub suffix: Option<String>,
}

impl ParsedNumber {
    pub fn new(n: i32, suffix: Option<String>) -> Self {
        Self { n, suffix }
    }
}

/// Converts step numbers to text and back.
pub trait NumberFormatter: Send + Sync {
    /// Format a number for display.
    fn format(&self, value: i32) -> String;

    /// Parse display text, first splitting off a trailing suffix matched by
    /// `suffix`. Returns `None` when the text is not a number in this
    /// notation.
    fn parse(&self, text: &str, suffix: Option<&Regex>) -> Option<ParsedNumber>;
}

/// Split a trailing suffix off `text`.
///
/// The suffix is the leftmost match of `suffix` that ends at the end of
/// the text and leaves a non-empty head.
pub fn split_suffix<'a>(text: &'a str, suffix: Option<&Regex>) -> (&'a str, Option<String>) {
    let Some(re) = suffix else {
        return (text, None);
    };
    match re
        .find_iter(text)
        .find(|m| m.end() == text.len() && m.start() > 0 && !m.as_str().is_empty())
    {
        Some(m) => (&text[..m.start()], Some(m.as_str().to_string())),
        None => (text, None),
    }
}

/// Plain decimal numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArabicNumberFormatter;

impl NumberFormatter for ArabicNumberFormatter {
    fn format(&self, value: i32) -> String {
        value.to_string()
    }

    fn parse(&self, text: &str, suffix: Option<&Regex>) -> Option<ParsedNumber> {
        let (head, suffix) = split_suffix(text.trim(), suffix);
        let n = head.trim().parse::<i32>().ok()?;
        Some(ParsedNumber::new(n, suffix))
    }
}

const ROMAN_DIGITS: &[(i32, &str)] = &[
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Longest canonical numeral below 4000 (`MMMDCCCLXXXVIII`).
const ROMAN_MAX_LEN: usize = 15;

/// Roman numerals, 1 to 3999.
///
/// Parsing is case-insensitive but only accepts canonical numerals
/// (`IV`, not `IIII`). Numbers outside the Roman range are formatted as
/// decimals.
#[derive(Debug, Clone, Copy, Default)]
pub struct RomanNumberFormatter {
    lowercase: bool,
}

impl RomanNumberFormatter {
    pub fn upper() -> Self {
        Self { lowercase: false }
    }

    pub fn lower() -> Self {
        Self { lowercase: true }
    }

    fn to_roman(mut value: i32) -> String {
        let mut out = String::new();
        for &(weight, digits) in ROMAN_DIGITS {
            while value >= weight {
                out.push_str(digits);
                value -= weight;
            }
        }
        out
    }

    fn from_roman(text: &str) -> Option<i32> {
        let mut total: i32 = 0;
        let mut previous = 0;
        for c in text.chars().rev() {
            let v = match c {
                'I' => 1,
                'V' => 5,
                'X' => 10,
                'L' => 50,
                'C' => 100,
                'D' => 500,
                'M' => 1000,
                _ => return None,
            };
            if v < previous {
                total = total.checked_sub(v)?;
            } else {
                total = total.checked_add(v)?;
                previous = v;
            }
        }
        Some(total)
    }
}

impl NumberFormatter for RomanNumberFormatter {
    fn format(&self, value: i32) -> String {
        if !(1..4000).contains(&value) {
            return value.to_string();
        }
        let roman = Self::to_roman(value);
        if self.lowercase {
            roman.to_lowercase()
        } else {
            roman
        }
    }

    fn parse(&self, text: &str, suffix: Option<&Regex>) -> Option<ParsedNumber> {
        let (head, suffix) = split_suffix(text.trim(), suffix);
        let upper = head.trim().to_uppercase();
        if upper.is_empty() || upper.len() > ROMAN_MAX_LEN {
            return None;
        }
        let n = Self::from_roman(&upper)?;
        // reject non-canonical forms such as IIII or IC
        if !(1..4000).contains(&n) || Self::to_roman(n) != upper {
            return None;
        }
        Some(ParsedNumber::new(n, suffix))
    }
}

/// Numbers written with an explicit label table, e.g. Greek letters for
/// the books of the Homeric poems.
#[derive(Debug, Clone, Default)]
pub struct MappedNumberFormatter {
    labels: IndexMap<String, i32>,
}

impl MappedNumberFormatter {
    pub fn new(labels: impl IntoIterator<Item = (impl Into<String>, i32)>) -> Self {
        Self {
            labels: labels.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl NumberFormatter for MappedNumberFormatter {
    /// The first label mapped to `value`, or the decimal number.
    fn format(&self, value: i32) -> String {
        self.labels
            .iter()
            .find(|(_, v)| **v == value)
            .map_or_else(|| value.to_string(), |(label, _)| label.clone())
    }

    fn parse(&self, text: &str, suffix: Option<&Regex>) -> Option<ParsedNumber> {
        let (head, suffix) = split_suffix(text.trim(), suffix);
        let n = *self.labels.get(head.trim())?;
        Some(ParsedNumber::new(n, suffix))
    }
}

/// Formatters keyed by format name.
#[derive(Clone)]
pub struct FormatterRegistry {
    formatters: HashMap<String, Arc<dyn NumberFormatter>>,
    fallback: Arc<dyn NumberFormatter>,
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatterRegistry {
    /// A registry holding the built-in Roman formatters.
    pub fn new() -> Self {
        let mut registry = Self {
            formatters: HashMap::new(),
            fallback: Arc::new(ArabicNumberFormatter),
        };
        registry.insert(ROMAN_FORMAT, Arc::new(RomanNumberFormatter::upper()));
        registry.insert(ROMAN_LOWER_FORMAT, Arc::new(RomanNumberFormatter::lower()));
        registry
    }

    pub fn insert(&mut self, key: impl Into<String>, formatter: Arc<dyn NumberFormatter>) {
        self.formatters.insert(key.into(), formatter);
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn NumberFormatter>> {
        self.formatters.get(key).cloned()
    }

    /// The formatter for a step format key: the registered one for a key,
    /// the Arabic fallback when the step has no key, `None` when the key is
    /// not registered.
    pub fn for_format(&self, key: Option<&str>) -> Option<&dyn NumberFormatter> {
        match key.filter(|k| !k.is_empty()) {
            Some(key) => self.formatters.get(key).map(|f| f.as_ref()),
            None => Some(self.fallback.as_ref()),
        }
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.formatters.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
