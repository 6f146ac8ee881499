/*
 * compare.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Ordering of citations.
//!
//! Steps compare by `(n, suffix)`: numbers first, then a value without a
//! suffix before any suffixed one, then suffixes lexicographically. So
//! `12 < 12a < 12c < 13`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::citation::{Citation, CitationEntry, StepValue};

/// Compare two suffixed numbers. An absent number sorts first.
pub fn compare_suffixed(
    a: Option<i32>,
    a_suffix: Option<&str>,
    b: Option<i32>,
    b_suffix: Option<&str>,
) -> Ordering {
    let a_suffix = a_suffix.filter(|s| !s.is_empty());
    let b_suffix = b_suffix.filter(|s| !s.is_empty());
    a.cmp(&b).then_with(|| match (a_suffix, b_suffix) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(y),
    })
}

/// Compare two step values by `(n, suffix)`.
pub fn compare_steps(a: &StepValue, b: &StepValue) -> Ordering {
    compare_suffixed(a.n, a.suffix(), b.n, b.suffix())
}

/// Compare two citations.
///
/// Citations of different schemes order by scheme id. Otherwise steps are
/// compared pairwise; when every shared position ties, the citation with
/// fewer steps comes first (`If. III` before `If. III 1`).
pub fn compare_citations(a: &Citation, b: &Citation) -> Ordering {
    if a.scheme_id != b.scheme_id {
        return a.scheme_id.cmp(&b.scheme_id);
    }
    for (x, y) in a.steps.iter().zip(&b.steps) {
        let ord = compare_steps(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.steps.len().cmp(&b.steps.len())
}

/// Compare optional citations; an absent citation sorts first.
pub fn compare_optional(a: Option<&Citation>, b: Option<&Citation>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_citations(a, b),
    }
}

/// Compare working-set entries: by first citation, then by range end with
/// open ranges first. A one-sided span ties with its bare citation.
pub fn compare_entries(a: &CitationEntry, b: &CitationEntry) -> Ordering {
    compare_citations(a.first(), b.first()).then_with(|| compare_optional(a.last(), b.last()))
}

/// Sort a mixed working set.
///
/// Entries are grouped by scheme id (entries without one join
/// `default_scheme_id`), each group is stable-sorted, and groups follow
/// each other in scheme id order.
pub fn sort_citations(entries: Vec<CitationEntry>, default_scheme_id: &str) -> Vec<CitationEntry> {
    let mut groups: BTreeMap<String, Vec<CitationEntry>> = BTreeMap::new();
    for entry in entries {
        let key = entry.first().scheme_id_or(default_scheme_id).to_string();
        groups.entry(key).or_default().push(entry);
    }
    groups
        .into_values()
        .flat_map(|mut group| {
            group.sort_by(compare_entries);
            group
        })
        .collect()
}
