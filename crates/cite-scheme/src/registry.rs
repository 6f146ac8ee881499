/*
 * registry.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The scheme registry.
//!
//! [`SchemeRegistry`] owns the active scheme set, the number formatters and
//! the citation parsers, and is the entry point for every engine operation.
//! The scheme set is an immutable snapshot behind a read-write lock:
//! [`SchemeRegistry::configure`] builds and validates a new snapshot, then
//! swaps it in whole, so readers never see a half-applied configuration.
//! Independent registries do not share any state.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::citation::{Citation, StepValue};
use crate::domain::{StepViolation, resolve_step_domain, validate_citation};
use crate::error::{Result, SchemeError};
use crate::formatter::{FormatterRegistry, MappedNumberFormatter, NumberFormatter};
use crate::parser::{CitationParser, ParseContext, PatternCitationParser};
use crate::pattern::PatternSet;
use crate::scheme::{CitationScheme, StepDomain};
use crate::settings::{SchemeSettings, SettingsStore};

/// Key of the default parser.
pub const DEFAULT_PARSER_KEY: &str = "";

/// Leading `@schemeId:` marker.
static SCHEME_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*@([^:\s]+):").unwrap());

/// A scheme id marker split off citation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemePrefix<'a> {
    pub scheme_id: &'a str,
    /// The text after the marker.
    pub rest: &'a str,
}

/// Split a leading `@schemeId:` marker off `text`.
pub fn extract_scheme_id(text: &str) -> Option<SchemePrefix<'_>> {
    let caps = SCHEME_PREFIX.captures(text)?;
    let marker = caps.get(0)?;
    Some(SchemePrefix {
        scheme_id: caps.get(1)?.as_str(),
        rest: &text[marker.end()..],
    })
}

/// A scheme with its compiled patterns.
#[derive(Debug, Clone)]
struct ConfiguredScheme {
    scheme: Arc<CitationScheme>,
    patterns: Arc<PatternSet>,
}

/// One configured scheme set.
#[derive(Debug, Default)]
struct ActiveSchemes {
    settings: SchemeSettings,
    schemes: IndexMap<String, ConfiguredScheme>,
    formatters: FormatterRegistry,
}

impl ActiveSchemes {
    fn build(
        mut settings: SchemeSettings,
        custom: Vec<(String, Arc<dyn NumberFormatter>)>,
    ) -> Result<Self> {
        let mut schemes = IndexMap::with_capacity(settings.schemes.len());
        for (id, scheme) in settings.schemes.iter_mut() {
            scheme.id = id.clone();
            validate_scheme(scheme)?;
            let patterns = PatternSet::for_scheme(scheme)?;
            schemes.insert(
                id.clone(),
                ConfiguredScheme {
                    scheme: Arc::new(scheme.clone()),
                    patterns: Arc::new(patterns),
                },
            );
        }

        let mut formatters = FormatterRegistry::new();
        for (key, table) in &settings.formats {
            let labels = table.iter().map(|(label, n)| (label.clone(), *n));
            formatters.insert(key.clone(), Arc::new(MappedNumberFormatter::new(labels)));
        }
        for (key, formatter) in custom {
            formatters.insert(key, formatter);
        }

        Ok(Self {
            settings,
            schemes,
            formatters,
        })
    }

    fn get(&self, id: &str) -> Option<&ConfiguredScheme> {
        self.schemes.get(id)
    }

    /// The scheme a citation belongs to: its own, or the default one.
    fn scheme_for(
        &self,
        citation: Option<&Citation>,
        default_scheme_id: Option<&str>,
    ) -> Option<&ConfiguredScheme> {
        citation
            .map(|c| c.scheme_id.as_str())
            .filter(|id| !id.is_empty())
            .and_then(|id| self.get(id))
            .or_else(|| default_scheme_id.and_then(|id| self.get(id)))
    }

    fn context<'a>(&'a self, configured: &'a ConfiguredScheme) -> ParseContext<'a> {
        ParseContext {
            formatters: &self.formatters,
            patterns: &configured.patterns,
        }
    }
}

/// Structural checks. Patterns are checked when they are compiled.
fn validate_scheme(scheme: &CitationScheme) -> Result<()> {
    for step in &scheme.path {
        if !scheme.steps.contains_key(step) {
            return Err(SchemeError::UnknownPathStep {
                scheme: scheme.id.clone(),
                step: step.clone(),
            });
        }
    }
    if let Some(step) = &scheme.optional_from {
        if scheme.step_index(step).is_none() {
            return Err(SchemeError::InvalidOptionalFrom {
                scheme: scheme.id.clone(),
                step: step.clone(),
            });
        }
    }
    Ok(())
}

/// Registry of citation schemes, number formatters and parsers.
pub struct SchemeRegistry {
    active: RwLock<Arc<ActiveSchemes>>,
    parsers: RwLock<HashMap<String, Arc<dyn CitationParser>>>,
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemeRegistry {
    /// An empty registry with the built-in formatters.
    pub fn new() -> Self {
        Self {
            active: RwLock::new(Arc::new(ActiveSchemes::default())),
            parsers: RwLock::new(HashMap::new()),
        }
    }

    /// A registry configured with `settings`.
    pub fn with_settings(settings: SchemeSettings) -> Result<Self> {
        let registry = Self::new();
        registry.configure(settings)?;
        Ok(registry)
    }

    /// A registry configured from the settings stored under `key`, or an
    /// empty one when the store has nothing there.
    pub fn from_settings_store(store: &dyn SettingsStore, key: &str) -> Result<Self> {
        let registry = Self::new();
        if let Some(text) = store.get(key) {
            registry.configure(SchemeSettings::from_json(&text)?)?;
        }
        Ok(registry)
    }

    /// Write the active settings to `store` under `key`.
    pub fn save_to_settings_store(&self, store: &mut dyn SettingsStore, key: &str) -> Result<()> {
        store.set(key, self.settings().to_json()?);
        Ok(())
    }

    /// Replace the whole configuration. On error the previous one stays
    /// active.
    pub fn configure(&self, settings: SchemeSettings) -> Result<()> {
        self.configure_with_formatters(settings, Vec::new())
    }

    /// Replace the whole configuration, registering additional formatter
    /// instances next to those built from `settings.formats`.
    pub fn configure_with_formatters(
        &self,
        settings: SchemeSettings,
        formatters: impl IntoIterator<Item = (String, Arc<dyn NumberFormatter>)>,
    ) -> Result<()> {
        let next = ActiveSchemes::build(settings, formatters.into_iter().collect())?;
        tracing::debug!(
            schemes = next.schemes.len(),
            formatters = ?next.formatters.keys(),
            "Configured citation schemes"
        );
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        Ok(())
    }

    fn snapshot(&self) -> Arc<ActiveSchemes> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The active settings.
    pub fn settings(&self) -> SchemeSettings {
        self.snapshot().settings.clone()
    }

    pub fn get_scheme(&self, id: &str) -> Option<Arc<CitationScheme>> {
        self.snapshot().get(id).map(|c| c.scheme.clone())
    }

    /// Like [`get_scheme`](Self::get_scheme), for callers that treat a
    /// missing scheme as a configuration error.
    pub fn require_scheme(&self, id: &str) -> Result<Arc<CitationScheme>> {
        self.get_scheme(id)
            .ok_or_else(|| SchemeError::SchemeNotFound { id: id.to_string() })
    }

    /// Schemes with the given ids (unknown ids are skipped), or all schemes
    /// in declaration order.
    pub fn get_schemes(&self, ids: Option<&[&str]>) -> Vec<Arc<CitationScheme>> {
        let active = self.snapshot();
        match ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| active.get(id).map(|c| c.scheme.clone()))
                .collect(),
            None => active.schemes.values().map(|c| c.scheme.clone()).collect(),
        }
    }

    pub fn get_scheme_ids(&self) -> Vec<String> {
        self.snapshot().schemes.keys().cloned().collect()
    }

    pub fn has_scheme_prefix(&self) -> bool {
        self.snapshot().settings.has_scheme_prefix
    }

    /// Register a formatter on the active configuration. It is dropped by
    /// the next [`configure`](Self::configure).
    pub fn add_formatter(&self, key: impl Into<String>, formatter: Arc<dyn NumberFormatter>) {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        let mut formatters = active.formatters.clone();
        formatters.insert(key, formatter);
        let next = ActiveSchemes {
            settings: active.settings.clone(),
            schemes: active.schemes.clone(),
            formatters,
        };
        *active = Arc::new(next);
    }

    pub fn get_formatter(&self, key: &str) -> Option<Arc<dyn NumberFormatter>> {
        self.snapshot().formatters.get(key)
    }

    pub fn add_parser(&self, key: impl Into<String>, parser: Arc<dyn CitationParser>) {
        self.parsers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), parser);
    }

    /// The parser registered under `key`. Asking for the default key
    /// registers [`PatternCitationParser`] if nothing is there yet.
    pub fn get_parser(&self, key: &str) -> Option<Arc<dyn CitationParser>> {
        if let Some(parser) = self
            .parsers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Some(parser.clone());
        }
        if key != DEFAULT_PARSER_KEY {
            return None;
        }
        let mut parsers = self.parsers.write().unwrap_or_else(PoisonError::into_inner);
        let parser = parsers
            .entry(DEFAULT_PARSER_KEY.to_string())
            .or_insert_with(|| {
                tracing::debug!("Registering default citation parser");
                let parser: Arc<dyn CitationParser> = Arc::new(PatternCitationParser::new());
                parser
            });
        Some(parser.clone())
    }

    fn parser_for(&self, scheme: &CitationScheme) -> Option<Arc<dyn CitationParser>> {
        let key = scheme
            .text_options
            .parser_key
            .as_deref()
            .unwrap_or(DEFAULT_PARSER_KEY);
        self.get_parser(key).or_else(|| {
            tracing::warn!(scheme = %scheme.id, parser = key, "Unknown parser, using default");
            self.get_parser(DEFAULT_PARSER_KEY)
        })
    }

    /// Parse citation text.
    ///
    /// The scheme comes from the `@schemeId:` marker when prefixes are
    /// enabled and the text has one, otherwise from `default_scheme_id`.
    /// Returns `None` when no registered scheme applies; unrecognized text
    /// gives a citation without steps.
    pub fn parse(&self, text: &str, default_scheme_id: Option<&str>) -> Option<Citation> {
        let active = self.snapshot();
        let prefix = extract_scheme_id(text).filter(|_| active.settings.has_scheme_prefix);
        let (scheme_id, body) = match prefix {
            Some(prefix) => (Some(prefix.scheme_id), prefix.rest),
            None => (default_scheme_id, text),
        };
        let Some(configured) = scheme_id.and_then(|id| active.get(id)) else {
            tracing::debug!(scheme = ?scheme_id, "No scheme for citation text");
            return None;
        };
        let parser = self.parser_for(&configured.scheme)?;
        Some(parser.parse(body, &configured.scheme, active.context(configured)))
    }

    /// Render a citation as text, with its `@schemeId:` marker when
    /// prefixes are enabled. A citation without steps renders empty.
    pub fn render(&self, citation: &Citation) -> Option<String> {
        let active = self.snapshot();
        let scheme = &active.get(&citation.scheme_id)?.scheme;
        let parser = self.parser_for(scheme)?;
        let text = parser.render(citation, scheme);
        if active.settings.has_scheme_prefix && !citation.is_empty() {
            Some(format!("@{}:{}", scheme.id, text))
        } else {
            Some(text)
        }
    }

    /// A citation with one blank step per path step, ready for editing.
    pub fn create_empty_citation(&self, scheme_id: &str) -> Option<Citation> {
        let scheme = self.get_scheme(scheme_id)?;
        let steps = scheme
            .path
            .iter()
            .map(|step_id| {
                let definition = scheme.step(step_id);
                StepValue {
                    step_id: step_id.clone(),
                    color: definition.and_then(|d| d.color.clone()),
                    format: definition.and_then(|d| d.format.clone()),
                    ..Default::default()
                }
            })
            .collect();
        Some(Citation::new(scheme_id, steps))
    }

    /// Position of `step_id` in the path of `scheme_id`.
    pub fn step_index(&self, scheme_id: &str, step_id: &str) -> Result<usize> {
        let scheme = self.require_scheme(scheme_id)?;
        scheme.step_index(step_id).ok_or_else(|| SchemeError::StepNotFound {
            scheme: scheme_id.to_string(),
            step: step_id.to_string(),
        })
    }

    /// The effective domain of a step, given the citation built so far.
    ///
    /// The scheme is the citation's, or `default_scheme_id`. Returns
    /// `None` when neither names a registered scheme or the scheme has no
    /// such step.
    pub fn get_step_domain(
        &self,
        step_id: &str,
        citation: Option<&Citation>,
        default_scheme_id: Option<&str>,
    ) -> Option<StepDomain> {
        let active = self.snapshot();
        let configured = active.scheme_for(citation, default_scheme_id)?;
        let definition = configured.scheme.step(step_id)?;
        let steps = citation.map_or(&[][..], |c| c.steps.as_slice());
        Some(resolve_step_domain(definition, steps, &configured.patterns).clone())
    }

    /// Check every step of a citation against its resolved domain.
    ///
    /// A citation whose scheme is not registered yields no violations.
    pub fn validate_citation(
        &self,
        citation: &Citation,
        default_scheme_id: Option<&str>,
    ) -> Vec<StepViolation> {
        let active = self.snapshot();
        match active.scheme_for(Some(citation), default_scheme_id) {
            Some(configured) => validate_citation(&configured.scheme, citation, &configured.patterns),
            None => Vec::new(),
        }
    }
}

impl std::fmt::Debug for SchemeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemeRegistry")
            .field("schemes", &self.get_scheme_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::ParsedNumber;
    use crate::scheme::{NumericRange, SchemeTextOptions, StepDefinition, StepKind};

    fn numeric(format: Option<&str>) -> StepDefinition {
        StepDefinition {
            kind: StepKind::Numeric,
            color: Some("#336699".to_string()),
            format: format.map(str::to_string),
            suffix_pattern: None,
            domain: StepDomain::Range(NumericRange::new(Some(1), None)),
            conditions: Vec::new(),
        }
    }

    fn scheme(pattern: &str) -> CitationScheme {
        CitationScheme {
            id: String::new(),
            name: "Books".to_string(),
            path: vec!["book".to_string(), "line".to_string()],
            optional_from: Some("line".to_string()),
            color: None,
            text_options: SchemeTextOptions {
                path_pattern: pattern.to_string(),
                template: "{book}.{line}".to_string(),
                parser_key: None,
                hint: None,
            },
            steps: [
                ("book".to_string(), numeric(Some("roman"))),
                ("line".to_string(), numeric(None)),
            ]
            .into_iter()
            .collect(),
        }
    }

    fn settings() -> SchemeSettings {
        let mut settings = SchemeSettings::default();
        settings
            .schemes
            .insert("bk".to_string(), scheme(r"^([IVXLC]+)(?:\.(\d+))?$"));
        settings
    }

    #[test]
    fn test_extract_scheme_id() {
        assert_eq!(
            extract_scheme_id("@dc:If. I 1"),
            Some(SchemePrefix {
                scheme_id: "dc",
                rest: "If. I 1"
            })
        );
        assert_eq!(extract_scheme_id("If. I 1"), None);
        assert_eq!(extract_scheme_id("@:x"), None);
    }

    #[test]
    fn test_configure_fills_ids() {
        let registry = SchemeRegistry::with_settings(settings()).unwrap();
        assert_eq!(registry.get_scheme_ids(), vec!["bk"]);
        assert_eq!(registry.get_scheme("bk").unwrap().id, "bk");
        assert!(registry.get_scheme("xx").is_none());
        assert!(matches!(
            registry.require_scheme("xx"),
            Err(SchemeError::SchemeNotFound { .. })
        ));
        assert_eq!(registry.get_schemes(Some(&["xx", "bk"][..])).len(), 1);
    }

    #[test]
    fn test_invalid_configuration_keeps_previous() {
        let registry = SchemeRegistry::with_settings(settings()).unwrap();

        let mut bad = SchemeSettings::default();
        bad.schemes.insert("bad".to_string(), scheme("(["));
        let err = registry.configure(bad).unwrap_err();
        assert!(matches!(err, SchemeError::InvalidPattern { .. }), "Got: {}", err);

        let mut missing = settings();
        missing.schemes["bk"].path.push("verse".to_string());
        let err = registry.configure(missing).unwrap_err();
        assert_eq!(
            err,
            SchemeError::UnknownPathStep {
                scheme: "bk".to_string(),
                step: "verse".to_string()
            }
        );

        let mut optional = settings();
        optional.schemes["bk"].optional_from = Some("verse".to_string());
        assert!(matches!(
            registry.configure(optional),
            Err(SchemeError::InvalidOptionalFrom { .. })
        ));

        assert_eq!(registry.get_scheme_ids(), vec!["bk"]);
    }

    #[test]
    fn test_configure_replaces_everything() {
        let registry = SchemeRegistry::with_settings(settings()).unwrap();
        registry.add_formatter("greek", Arc::new(MappedNumberFormatter::new([("α", 1)])));
        assert!(registry.get_formatter("greek").is_some());

        registry.configure(SchemeSettings::default()).unwrap();
        assert!(registry.get_scheme_ids().is_empty());
        assert!(registry.get_formatter("greek").is_none());
        assert!(registry.get_formatter("roman").is_some());
    }

    #[test]
    fn test_formats_become_mapped_formatters() {
        let mut settings = settings();
        settings
            .formats
            .insert("greek".to_string(), [("α".to_string(), 1), ("β".to_string(), 2)].into_iter().collect());
        let registry = SchemeRegistry::with_settings(settings).unwrap();
        let greek = registry.get_formatter("greek").unwrap();
        assert_eq!(greek.parse("β", None), Some(ParsedNumber::new(2, None)));
        assert_eq!(greek.format(1), "α");
    }

    #[test]
    fn test_default_parser_is_registered_lazily() {
        let registry = SchemeRegistry::new();
        assert!(registry.get_parser("custom").is_none());
        assert!(registry.get_parser(DEFAULT_PARSER_KEY).is_some());
        registry.add_parser("custom", Arc::new(PatternCitationParser::new()));
        assert!(registry.get_parser("custom").is_some());
    }

    #[test]
    fn test_parse_and_render() {
        let registry = SchemeRegistry::with_settings(settings()).unwrap();
        let citation = registry.parse("XIV.3", Some("bk")).unwrap();
        assert_eq!(citation.steps.len(), 2);
        assert_eq!(citation.steps[0].n, Some(14));
        assert_eq!(citation.steps[0].color.as_deref(), Some("#336699"));
        assert_eq!(citation.steps[1].n, Some(3));
        assert_eq!(registry.render(&citation).as_deref(), Some("XIV.3"));

        let partial = registry.parse("XIV", Some("bk")).unwrap();
        assert_eq!(partial.steps.len(), 1);
        assert_eq!(registry.render(&partial).as_deref(), Some("XIV"));

        assert!(registry.parse("14.3", Some("bk")).unwrap().is_empty());
        assert!(registry.parse("XIV.3", Some("xx")).is_none());
        assert!(registry.parse("XIV.3", None).is_none());
    }

    #[test]
    fn test_prefix_is_ignored_when_disabled() {
        let registry = SchemeRegistry::with_settings(settings()).unwrap();
        assert!(!registry.has_scheme_prefix());
        let citation = registry.parse("@bk:XIV", Some("bk")).unwrap();
        assert!(citation.is_empty());
    }

    #[test]
    fn test_empty_citation_template() {
        let registry = SchemeRegistry::with_settings(settings()).unwrap();
        let citation = registry.create_empty_citation("bk").unwrap();
        assert_eq!(citation.scheme_id, "bk");
        assert_eq!(citation.steps.len(), 2);
        assert_eq!(citation.steps[0].step_id, "book");
        assert_eq!(citation.steps[0].format.as_deref(), Some("roman"));
        assert_eq!(citation.steps[1].format, None);
        assert!(citation.steps.iter().all(|s| s.value.is_empty() && s.n.is_none()));
        assert!(registry.create_empty_citation("xx").is_none());
    }

    #[test]
    fn test_step_index() {
        let registry = SchemeRegistry::with_settings(settings()).unwrap();
        assert_eq!(registry.step_index("bk", "line"), Ok(1));
        assert!(matches!(
            registry.step_index("bk", "verse"),
            Err(SchemeError::StepNotFound { .. })
        ));
    }

    #[test]
    fn test_step_domain_not_found() {
        let registry = SchemeRegistry::with_settings(settings()).unwrap();
        assert!(registry.get_step_domain("book", None, None).is_none());
        assert!(registry.get_step_domain("verse", None, Some("bk")).is_none());
        assert_eq!(
            registry.get_step_domain("book", None, Some("bk")),
            Some(StepDomain::Range(NumericRange::new(Some(1), None)))
        );
    }

    #[test]
    fn test_configured_schemes_have_compiled_patterns() {
        let registry = SchemeRegistry::with_settings(settings()).unwrap();
        let active = registry.snapshot();
        let configured = active.get("bk").unwrap();
        assert!(configured.patterns.contains(r"^([IVXLC]+)(?:\.(\d+))?$"));
    }

    #[test]
    fn test_empty_citation_renders_without_prefix() {
        let mut settings = settings();
        settings.has_scheme_prefix = true;
        let registry = SchemeRegistry::with_settings(settings).unwrap();
        let citation = registry.parse("@bk:XIV", None).unwrap();
        assert_eq!(registry.render(&citation).as_deref(), Some("@bk:XIV"));

        let unparsed = registry.parse("@bk:14", None).unwrap();
        assert!(unparsed.is_empty());
        assert_eq!(registry.render(&unparsed).as_deref(), Some(""));
    }

    #[test]
    fn test_parse_reads_one_configuration() {
        // Both configurations read "@bk:14" as book 14; mixing the prefix
        // flag of one with the pattern of the other reads nothing.
        let mut prefixed = settings();
        prefixed.has_scheme_prefix = true;
        prefixed.schemes["bk"].text_options.path_pattern = r"^(\d+)$".to_string();
        let mut literal = settings();
        literal.schemes["bk"].text_options.path_pattern = r"^@bk:(\d+)$".to_string();

        let registry = SchemeRegistry::with_settings(prefixed.clone()).unwrap();
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..500 {
                    let next = if i % 2 == 0 { literal.clone() } else { prefixed.clone() };
                    registry.configure(next).unwrap();
                }
            });
            for _ in 0..2000 {
                let citation = registry.parse("@bk:14", Some("bk")).unwrap();
                assert_eq!(citation.steps.len(), 1);
                assert_eq!(citation.steps[0].value, "14");
            }
        });
    }
}
