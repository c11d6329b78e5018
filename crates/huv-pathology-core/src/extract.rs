//! Field extractor: applies a pattern registry to OCR text.

use tracing::debug;

use crate::models::RawExtraction;
use crate::patterns::{FieldRule, FieldShape, PatternRegistry};
use crate::text::{collapse_block, collapse_whitespace};

/// Apply every rule in order; misses are stored as empty strings.
pub fn extract_fields(text: &str, registry: &PatternRegistry) -> RawExtraction {
    let mut raw = RawExtraction::new();

    for rule in registry.rules() {
        let value = extract_field(text, rule).unwrap_or_default();
        raw.insert(rule.field(), value);
    }

    debug!(
        report_type = %registry.report_type(),
        registered = raw.len(),
        captured = raw.captured_count(),
        "Extracted fields"
    );

    raw
}

/// First capture of `rule` in `text`, shaped and trimmed.
///
/// Returns `None` when the pattern misses, has no first group, or captures
/// only whitespace.
pub fn extract_field(text: &str, rule: &FieldRule) -> Option<String> {
    let captures = rule.regex()?.captures(text)?;
    let captured = captures.get(1)?.as_str();

    let value = match rule.shape() {
        FieldShape::Inline => collapse_whitespace(captured),
        FieldShape::Block => collapse_block(captured),
    };

    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
