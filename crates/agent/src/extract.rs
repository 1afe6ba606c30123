//! JSON extraction from model output
//!
//! Four stages parse structured answers out of free-form model text, all
//! through this one utility. Contract: prefer a fenced ```json block,
//! else take the first balanced `{...}` span that parses, else try the
//! whole string; otherwise fail with the raw text attached.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)```").expect("static regex"));

/// Extraction failures, raw model text attached for diagnostics
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no json object found in model output")]
    NotFound { raw: String },

    #[error("json object did not match the expected shape: {detail}")]
    Shape { raw: String, detail: String },
}

impl ExtractError {
    /// The model output that failed to parse
    pub fn raw(&self) -> &str {
        match self {
            ExtractError::NotFound { raw } | ExtractError::Shape { raw, .. } => raw,
        }
    }
}

/// Find the first JSON object in raw model output
pub fn extract_json(raw: &str) -> Result<Value, ExtractError> {
    // Fenced block wins when present
    if let Some(captures) = FENCED_JSON.captures(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(captures[1].trim()) {
            if value.is_object() {
                return Ok(value);
            }
        }
    }

    // First balanced brace span that parses
    let mut search_from = 0;
    while let Some(offset) = raw[search_from..].find('{') {
        let start = search_from + offset;
        match balanced_span(raw, start) {
            Some(span) => {
                if let Ok(value) = serde_json::from_str::<Value>(span) {
                    return Ok(value);
                }
                search_from = start + 1;
            }
            None => break,
        }
    }

    // Bare JSON with no decoration
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        if value.is_object() {
            return Ok(value);
        }
    }

    Err(ExtractError::NotFound {
        raw: raw.to_string(),
    })
}

/// Extract and deserialize into a concrete shape
pub fn extract_typed<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractError> {
    let value = extract_json(raw)?;
    serde_json::from_value(value).map_err(|e| ExtractError::Shape {
        raw: raw.to_string(),
        detail: e.to_string(),
    })
}

/// Span of the balanced `{...}` starting at `start`, string- and
/// escape-aware so braces inside string literals don't count.
fn balanced_span(raw: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in raw[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
