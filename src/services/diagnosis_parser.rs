//! Extraction of a JSON object from untrusted model text.
//!
//! Model replies may wrap the object in prose or a code fence, carry trailing
//! commas, or not contain JSON at all. [`parse_model_json`] recovers the first
//! complete object when one exists and fails with a typed error otherwise.

use serde_json::{Map, Value};
use thiserror::Error;

const FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum DiagnosisParseError {
    #[error("No JSON object found in model response")]
    NoJsonObjectFound,

    #[error("Invalid JSON in model response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Remove a surrounding triple-backtick fence (with optional language tag).
///
/// Text that does not start with a fence is only trimmed.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.first().is_some_and(|line| line.trim_start().starts_with(FENCE)) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.trim() == FENCE) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Parse the first JSON object embedded in `text`.
pub fn parse_model_json(text: &str) -> Result<Map<String, Value>, DiagnosisParseError> {
    let stripped = strip_code_fence(text);
    let candidate = extract_first_object(&stripped)?;

    let value = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => value,
        Err(_) => serde_json::from_str::<Value>(&remove_trailing_commas(candidate))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(DiagnosisParseError::NotAnObject(json_kind(&other))),
    }
}

/// Minimal balanced `{...}` substring, starting from the first line that
/// opens with `{` (or the first `{` anywhere when no line does).
fn extract_first_object(text: &str) -> Result<&str, DiagnosisParseError> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_start().starts_with('{') {
            break;
        }
        offset += line.len();
    }
    let from_line = if offset < text.len() { &text[offset..] } else { text };

    let start = from_line
        .find('{')
        .ok_or(DiagnosisParseError::NoJsonObjectFound)?;
    let bytes = from_line.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &byte) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(&from_line[start..=i]);
                }
            }
            _ => {}
        }
    }

    Err(DiagnosisParseError::NoJsonObjectFound)
}

/// Drop commas followed (ignoring whitespace) by `}` or `]`, outside strings.
fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            out.push(ch);
            continue;
        }

        if ch == '"' {
            in_string = true;
        } else if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        out.push(ch);
    }

    out
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
