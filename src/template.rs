//! Prompt template rendering.
//!
//! Placeholders look like `{{ column }}`; whitespace inside the braces is ignored.
//! `{{json}}` expands to the whole record as compact JSON. Unknown columns expand to
//! the empty string, so rendering never fails.

use crate::types::record::{value_text, Record};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    // Literal pattern; compiling it cannot fail.
    Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("placeholder regex")
});

/// Key that expands to the JSON serialization of the whole record.
pub const JSON_KEY: &str = "json";

/// Render `template` against `record`.
pub fn render(template: &str, record: &Record) -> String {
    render_with_context(template, record, &HashMap::new())
}

/// Render with extra bindings consulted after the record's own columns.
pub fn render_with_context(
    template: &str,
    record: &Record,
    extra: &HashMap<String, String>,
) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            if key == JSON_KEY {
                return record.to_json_string();
            }
            match record.get(key) {
                Some(v) => value_text(v),
                None => extra.get(key).cloned().unwrap_or_default(),
            }
        })
        .into_owned()
}

/// Placeholder keys referenced by a template, in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        if let Some(m) = caps.get(1) {
            if !keys.iter().any(|k| k == m.as_str()) {
                keys.push(m.as_str().to_string());
            }
        }
    }
    keys
}
