/*
 * commands.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Subcommand implementations. Each returns its output so `main` only
//! decides where it goes.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use cite_scheme::{
    Citation, CitationEntry, SchemeRegistry, SchemeSettings, StepViolation, compact_citations,
    sort_citations,
};

/// Load a registry from a JSON or YAML settings file.
pub fn load_registry(path: &Path) -> Result<SchemeRegistry> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schemes file: {}", path.display()))?;
    let settings = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => SchemeSettings::from_yaml(&text),
        _ => SchemeSettings::from_json(&text),
    }
    .with_context(|| format!("Failed to load schemes from {}", path.display()))?;
    let registry = SchemeRegistry::with_settings(settings)
        .with_context(|| format!("Invalid schemes in {}", path.display()))?;
    tracing::debug!(schemes = ?registry.get_scheme_ids(), "Loaded schemes");
    Ok(registry)
}

fn parse_citation(registry: &SchemeRegistry, text: &str, scheme: Option<&str>) -> Result<Citation> {
    registry
        .parse(text, scheme)
        .with_context(|| format!("No citation scheme applies to '{}'", text))
}

pub fn parse(registry: &SchemeRegistry, texts: &[String], scheme: Option<&str>) -> Result<String> {
    let citations = texts
        .iter()
        .map(|text| parse_citation(registry, text, scheme))
        .collect::<Result<Vec<_>>>()?;
    Ok(serde_json::to_string_pretty(&citations)?)
}

pub fn render(registry: &SchemeRegistry, file: &Path) -> Result<Vec<String>> {
    let json = fs::read_to_string(file)
        .with_context(|| format!("Failed to read citations file: {}", file.display()))?;
    let entries: Vec<CitationEntry> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse citations in {}", file.display()))?;
    entries
        .iter()
        .map(|entry| {
            registry
                .entry_to_string(entry)
                .with_context(|| format!("Unknown scheme '{}'", entry.first().scheme_id))
        })
        .collect()
}

pub fn sort(
    registry: &SchemeRegistry,
    texts: &[String],
    scheme: Option<&str>,
    compact: bool,
) -> Result<Vec<String>> {
    let entries = texts
        .iter()
        .map(|text| {
            registry
                .parse_entry(text, scheme)
                .with_context(|| format!("Not a citation: '{}'", text))
        })
        .collect::<Result<Vec<_>>>()?;
    let mut sorted = sort_citations(entries, scheme.unwrap_or_default());
    if compact {
        sorted = compact_citations(sorted);
    }
    sorted
        .iter()
        .map(|entry| {
            registry
                .entry_to_string(entry)
                .context("Entry lost its scheme while sorting")
        })
        .collect()
}

pub fn span(
    registry: &SchemeRegistry,
    text: &str,
    separator: &str,
    scheme: Option<&str>,
) -> Result<String> {
    let span = registry
        .parse_span_with(text, separator, scheme)
        .with_context(|| format!("Not a citation span: '{}'", text))?;
    Ok(serde_json::to_string_pretty(&span)?)
}

pub fn domain(
    registry: &SchemeRegistry,
    step: &str,
    text: Option<&str>,
    scheme: Option<&str>,
) -> Result<String> {
    let citation = text
        .map(|text| parse_citation(registry, text, scheme))
        .transpose()?;
    let domain = registry
        .get_step_domain(step, citation.as_ref(), scheme)
        .with_context(|| format!("No step '{}' in the selected scheme", step))?;
    Ok(serde_json::to_string_pretty(&domain)?)
}

/// Validation result for one citation text.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub text: String,
    pub violations: Vec<StepViolation>,
}

impl CheckReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

pub fn check(registry: &SchemeRegistry, texts: &[String], scheme: Option<&str>) -> Result<Vec<CheckReport>> {
    texts
        .iter()
        .map(|text| {
            let citation = parse_citation(registry, text, scheme)?;
            Ok(CheckReport {
                text: text.clone(),
                violations: registry.validate_citation(&citation, scheme),
            })
        })
        .collect()
}
