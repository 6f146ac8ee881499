/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Citation parsers.
//!
//! A [`CitationParser`] turns scheme-specific text into a [`Citation`] and
//! back. Parsers are registered by key in the
//! [`SchemeRegistry`](crate::SchemeRegistry); a scheme picks one through
//! `textOptions.parserKey`, and [`PatternCitationParser`] is the default.

use crate::citation::{Citation, StepValue};
use crate::domain::resolve_step_domain;
use crate::formatter::FormatterRegistry;
use crate::pattern::PatternSet;
use crate::scheme::{CitationScheme, StepDefinition, StepKind};

/// Configuration a parser reads besides the scheme itself, taken from one
/// registry snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub formatters: &'a FormatterRegistry,
    /// The scheme's compiled patterns.
    pub patterns: &'a PatternSet,
}

/// Parses and renders the text form of a scheme's citations.
pub trait CitationParser: Send + Sync {
    /// Parse `text`. Text the scheme does not recognize yields a citation
    /// with no steps.
    fn parse(&self, text: &str, scheme: &CitationScheme, context: ParseContext<'_>) -> Citation;

    /// Render a citation of `scheme` as text.
    fn render(&self, citation: &Citation, scheme: &CitationScheme) -> String;
}

/// Parser driven by the scheme's path pattern and render template.
///
/// The path pattern has one capture group per step: a group named after
/// the step if there is one, otherwise the group at the step's position.
/// Parsing stops at the first step whose group did not capture anything,
/// which is how trailing optional steps are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternCitationParser;

impl PatternCitationParser {
    pub fn new() -> Self {
        Self
    }
}

impl CitationParser for PatternCitationParser {
    fn parse(&self, text: &str, scheme: &CitationScheme, context: ParseContext<'_>) -> Citation {
        let Some(re) = context.patterns.get(&scheme.text_options.path_pattern) else {
            return Citation::empty(&scheme.id);
        };
        let Some(caps) = re.captures(text) else {
            tracing::debug!(scheme = %scheme.id, text, "Text does not match path pattern");
            return Citation::empty(&scheme.id);
        };

        let mut steps: Vec<StepValue> = Vec::with_capacity(scheme.path.len());
        for (i, step_id) in scheme.path.iter().enumerate() {
            let value = caps
                .name(step_id)
                .or_else(|| caps.get(i + 1))
                .map_or("", |m| m.as_str().trim());
            if value.is_empty() {
                break;
            }
            let Some(definition) = scheme.step(step_id) else {
                break;
            };
            let step = resolve_step_value(step_id, definition, value, &steps, context);
            steps.push(step);
        }
        Citation::new(&scheme.id, steps)
    }

    fn render(&self, citation: &Citation, scheme: &CitationScheme) -> String {
        let values: Vec<&str> = citation.steps.iter().map(|s| s.value.as_str()).collect();
        render_template(&scheme.text_options.template, &values)
    }
}

/// Build the value of one step from its matched text.
///
/// `preceding` holds the steps parsed so far; they decide the domain that
/// set steps take their position from.
fn resolve_step_value(
    step_id: &str,
    definition: &StepDefinition,
    value: &str,
    preceding: &[StepValue],
    context: ParseContext<'_>,
) -> StepValue {
    let mut step = StepValue {
        step_id: step_id.to_string(),
        color: definition.color.clone(),
        value: value.to_string(),
        n: None,
        suffix: None,
        format: definition.format.clone(),
    };

    match definition.kind {
        StepKind::Set => {
            step.n = resolve_step_domain(definition, preceding, context.patterns).set_position(value);
        }
        StepKind::Numeric => match context.formatters.for_format(definition.format.as_deref()) {
            Some(formatter) => {
                let suffix = definition
                    .suffix_pattern
                    .as_deref()
                    .and_then(|pattern| context.patterns.get(pattern));
                if let Some(parsed) = formatter.parse(value, suffix.as_deref()) {
                    step.n = Some(parsed.n);
                    step.suffix = parsed.suffix;
                }
            }
            None => {
                tracing::warn!(
                    step = step_id,
                    format = ?definition.format,
                    "No formatter registered for step format"
                );
            }
        },
        StepKind::Text | StepKind::Masked => {}
    }
    step
}

#[derive(Debug, PartialEq)]
enum TemplatePart<'a> {
    Literal(&'a str),
    Placeholder,
}

fn template_parts(template: &str) -> Vec<TemplatePart<'_>> {
    let mut parts = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(len) = rest[open..].find('}') else {
            break;
        };
        parts.push(TemplatePart::Literal(&rest[..open]));
        parts.push(TemplatePart::Placeholder);
        rest = &rest[open + len + 1..];
    }
    parts.push(TemplatePart::Literal(rest));
    parts
}

/// Fill the `{step}` placeholders of `template` with `values` in order.
///
/// Placeholders past the end of `values` are dropped together with the
/// literal text that leads into them, and the trailing literal is kept
/// only when every placeholder was filled.
pub fn render_template(template: &str, values: &[&str]) -> String {
    if values.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    let mut filled = 0;
    let mut pending: &str = "";
    let mut complete = true;

    for part in template_parts(template) {
        match part {
            TemplatePart::Literal(text) => pending = text,
            TemplatePart::Placeholder => {
                let Some(value) = values.get(filled) else {
                    complete = false;
                    break;
                };
                out.push_str(pending);
                out.push_str(value);
                pending = "";
                filled += 1;
            }
        }
    }
    if complete {
        out.push_str(pending);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parts() {
        assert_eq!(
            template_parts("{a} {b}."),
            vec![
                TemplatePart::Literal(""),
                TemplatePart::Placeholder,
                TemplatePart::Literal(" "),
                TemplatePart::Placeholder,
                TemplatePart::Literal("."),
            ]
        );
    }

    #[test]
    fn test_render_full_and_partial() {
        let template = "{cantica} {canto} {verso}";
        assert_eq!(render_template(template, &["If.", "XXVI", "112"]), "If. XXVI 112");
        assert_eq!(render_template(template, &["If.", "XXVI"]), "If. XXVI");
        assert_eq!(render_template(template, &["If."]), "If.");
        assert_eq!(render_template(template, &[]), "");
    }

    #[test]
    fn test_render_keeps_literals() {
        let template = "[{book}, {line}]";
        assert_eq!(render_template(template, &["α", "12"]), "[α, 12]");
        assert_eq!(render_template(template, &["α"]), "[α");
    }

    #[test]
    fn test_extra_values_are_ignored() {
        assert_eq!(render_template("{a}", &["1", "2"]), "1");
    }
}
