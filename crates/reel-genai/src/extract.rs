//! JSON extraction from free-form model output.
//!
//! Generative text services return prose that usually, but not always,
//! contains the requested JSON. The parser chain here is deterministic:
//! direct parse, then fenced-block strip, then first balanced JSON
//! substring. Anything else is surfaced as raw text so callers can
//! apply their structural default.

use serde::de::DeserializeOwned;

/// Result of extracting structured data from model text.
#[derive(Debug, Clone)]
pub enum Extracted<T> {
    /// The text contained parseable JSON
    Structured(T),
    /// No JSON could be recovered; the original text is preserved
    RawText(String),
}

impl<T> Extracted<T> {
    pub fn is_structured(&self) -> bool {
        matches!(self, Extracted::Structured(_))
    }

    /// Unwrap the structured value or fall back to the supplied default.
    pub fn into_structured_or(self, default: T) -> T {
        match self {
            Extracted::Structured(value) => value,
            Extracted::RawText(_) => default,
        }
    }

    /// Unwrap the structured value or build the default lazily.
    pub fn into_structured_or_else(self, default: impl FnOnce() -> T) -> T {
        match self {
            Extracted::Structured(value) => value,
            Extracted::RawText(_) => default(),
        }
    }
}

/// Run the parser chain over model output.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Extracted<T> {
    let trimmed = text.trim();

    // 1. The whole payload is JSON
    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Extracted::Structured(value);
    }

    // 2. JSON wrapped in a markdown fence
    if let Some(inner) = strip_code_fence(trimmed) {
        if let Ok(value) = serde_json::from_str::<T>(inner.trim()) {
            return Extracted::Structured(value);
        }
    }

    // 3. First balanced JSON object or array embedded in prose
    if let Some(candidate) = first_balanced_json(trimmed) {
        if let Ok(value) = serde_json::from_str::<T>(candidate) {
            return Extracted::Structured(value);
        }
    }

    Extracted::RawText(text.to_string())
}

/// Strip a leading ```json (or bare ```) fence and its closing fence.
fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))?;
    let rest = rest.trim_start_matches(['\r', '\n']);
    let end = rest.rfind("```")?;
    Some(&rest[..end])
}

/// Find the first balanced `{...}` or `[...]` region, respecting
/// string literals and escapes.
fn first_balanced_json(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{' || b == b'[')?;
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            _ if b == open => depth += 1,
            _ if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
