//! Utility helpers shared by the Specsource crates.
//!
//! - **`http`**: path-template resolution and strict response parsing
//! - **`openapi_validation`**: cheap preflight checks for OpenAPI documents
//! - **`schema`**: `$ref`-aware JSON schema helpers with cycle protection
//! - **`path_processing`**: filesystem path helpers

pub mod http;
pub mod openapi_validation;
pub mod path_processing;
pub mod schema;

pub use http::*;
pub use path_processing::expand_tilde;

use once_cell::sync::Lazy;
use regex::Regex;

static REDACTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(authorization: )([\w\-\.=:/+]+(?: [\w\-\.=:/+]+)?)",
        r"(?i)([A-Z0-9_]*?(KEY|TOKEN|SECRET|PASSWORD))=([^\s]+)",
        r#"(?i)("(?:api_key|token|secret|password)"\s*:\s*)("[^"]*")"#,
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a string.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in REDACTION_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}<redacted>", prefix)
            })
            .to_string();
    }
    redacted
}
