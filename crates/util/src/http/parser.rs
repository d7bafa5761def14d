//! # Response parsing
//!
//! Helpers for turning raw listing responses into JSON collections.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Wrapper keys commonly used by list endpoints, probed in order.
pub const RESPONSE_ARRAY_PRIORITY_KEYS: &[&str] = &["items", "results", "data", "values", "entries", "list"];

/// Parse HTTP response text into JSON, providing detailed errors on failure.
///
/// This helper performs strict JSON deserialization and decorates any parsing
/// error with context about the originating HTTP status code plus a truncated
/// preview of the response body.
///
/// # Errors
/// Returns a [`JsonParseError`] describing the parse failure. The message
/// includes the original serde error and up to 200 characters of the response
/// body (with whitespace collapsed).
pub fn parse_response_json_strict(text: &str, status: Option<StatusCode>) -> Result<Value, JsonParseError> {
    serde_json::from_str::<Value>(text).map_err(|error| {
        let status_note = status
            .map(|code| format!("status {code}"))
            .unwrap_or_else(|| "unknown status".to_string());
        let preview = truncate_response_preview(text, 200);

        JsonParseError::new(status_note, error, preview)
    })
}

fn truncate_response_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for ch in text.chars() {
        if preview.len() >= limit {
            preview.push_str("...");
            break;
        }
        match ch {
            '\n' | '\r' | '\t' => {
                if !preview.ends_with(' ') {
                    preview.push(' ');
                }
            }
            _ => preview.push(ch),
        }
    }

    preview.trim().to_string()
}

/// Extract list-like collection items from a listing payload.
///
/// Extraction order:
/// 1. Use an explicit `list_response_path` (dot separated) if provided.
/// 2. Use a top-level array payload directly.
/// 3. Apply wrapper-key heuristics (`items`, `results`, `data`, ...).
/// 4. Fall back to the single array-valued field of a wrapper object.
pub fn extract_collection_items(payload: Value, list_response_path: Option<&str>) -> Option<Vec<Value>> {
    if let Some(path) = list_response_path
        && let Some(items) = extract_array_at_path(&payload, path)
    {
        return Some(items);
    }

    match payload {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            for key in RESPONSE_ARRAY_PRIORITY_KEYS {
                if matches!(map.get(*key), Some(Value::Array(_)))
                    && let Some(Value::Array(items)) = map.remove(*key)
                {
                    return Some(items);
                }
            }

            let mut arrays = map.into_iter().filter_map(|(_, value)| match value {
                Value::Array(items) => Some(items),
                _ => None,
            });
            let first = arrays.next()?;
            if arrays.next().is_none() {
                return Some(first);
            }
            None
        }
        _ => None,
    }
}

fn extract_array_at_path(payload: &Value, path: &str) -> Option<Vec<Value>> {
    if path == "." || path.is_empty() {
        return payload.as_array().cloned();
    }

    let mut current = payload;
    for segment in path.split('.') {
        if segment.is_empty() {
            continue;
        }
        current = current.get(segment)?;
    }

    current.as_array().cloned()
}

/// Error returned when strict JSON parsing of an HTTP response fails.
#[derive(Debug, Error)]
#[error("failed to parse JSON response ({status_note}): {source}. body preview: {body_preview}")]
pub struct JsonParseError {
    status_note: String,
    #[source]
    source: serde_json::Error,
    body_preview: String,
}

impl JsonParseError {
    /// Create a new [`JsonParseError`] with contextual information.
    pub fn new(status_note: String, source: serde_json::Error, body_preview: String) -> Self {
        Self {
            status_note,
            source,
            body_preview,
        }
    }

    /// Access the truncated response preview captured during parsing.
    pub fn body_preview(&self) -> &str {
        &self.body_preview
    }
}
