//! OpenAPI document preflight validation helpers.
//!
//! Lightweight validation performed before resources are discovered from an
//! OpenAPI source, so structural problems are reported together rather than
//! surfacing one at a time deep inside discovery.

use std::fmt;

use serde_json::Value;

/// Represents a structured OpenAPI preflight validation violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenApiValidationViolation {
    /// JSON path where the violation occurred.
    pub path: String,
    /// Stable rule identifier for machine-readable handling.
    pub rule: String,
    /// Human-readable validation error message.
    pub message: String,
}

impl OpenApiValidationViolation {
    /// Creates a new validation violation.
    pub fn new(path: impl Into<String>, rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for OpenApiValidationViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.path, self.rule, self.message)
    }
}

/// Validates an OpenAPI document for resource discovery.
///
/// This preflight ensures:
/// - The document declares `openapi: 3.x` or `swagger: 2.0`.
/// - `paths` exists and is an object.
/// - At least one `GET` operation exists under `paths`, since data sources
///   are built exclusively from listing operations.
pub fn collect_openapi_preflight_violations(document: &Value) -> Vec<OpenApiValidationViolation> {
    let mut violations = Vec::new();

    match (document.get("openapi"), document.get("swagger")) {
        (Some(Value::String(version)), _) if version.starts_with("3.") => {}
        (Some(Value::String(version)), _) => violations.push(OpenApiValidationViolation::new(
            "$.openapi",
            "openapi_version",
            format!("unsupported OpenAPI version '{}'; expected a 3.x document", version),
        )),
        (Some(_), _) => violations.push(OpenApiValidationViolation::new(
            "$.openapi",
            "openapi_version",
            "field `openapi` must be a string and start with `3.`",
        )),
        (None, Some(Value::String(version))) if version.starts_with("2.") => {}
        (None, Some(_)) => violations.push(OpenApiValidationViolation::new(
            "$.swagger",
            "openapi_version",
            "field `swagger` must be the string `2.0`",
        )),
        (None, None) => violations.push(OpenApiValidationViolation::new(
            "$.openapi",
            "openapi_version",
            "missing required `openapi` (3.x) or `swagger` (2.0) field",
        )),
    }

    let paths = match document.get("paths") {
        Some(Value::Object(paths)) => Some(paths),
        Some(_) => {
            violations.push(OpenApiValidationViolation::new(
                "$.paths",
                "paths_type",
                "field `paths` must be an object",
            ));
            None
        }
        None => {
            violations.push(OpenApiValidationViolation::new(
                "$.paths",
                "paths_required",
                "missing required `paths` object",
            ));
            None
        }
    };

    if let Some(paths) = paths {
        let list_operation_count = paths
            .values()
            .filter_map(Value::as_object)
            .filter(|path_item| path_item.contains_key("get"))
            .count();
        if list_operation_count == 0 {
            violations.push(OpenApiValidationViolation::new(
                "$.paths",
                "get_operations_presence",
                "no GET operations were found under `paths`",
            ));
        }
    }

    violations
}

/// Returns `Ok(())` when preflight validation passes, otherwise returns all violations.
pub fn validate_openapi_preflight(document: &Value) -> Result<(), Vec<OpenApiValidationViolation>> {
    let violations = collect_openapi_preflight_violations(document);
    if violations.is_empty() {
        return Ok(());
    }
    Err(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_missing_version() {
        let document = json!({ "paths": { "/cdns": { "get": {} } } });

        let violations = collect_openapi_preflight_violations(&document);

        assert!(violations.iter().any(|violation| violation.path == "$.openapi"));
    }

    #[test]
    fn accepts_swagger_v2_document() {
        let document = json!({ "swagger": "2.0", "paths": { "/cdns": { "get": {} } } });

        assert!(validate_openapi_preflight(&document).is_ok());
    }

    #[test]
    fn reports_documents_without_get_operations() {
        let document = json!({ "openapi": "3.0.3", "paths": { "/cdns": { "post": {} } } });

        let violations = collect_openapi_preflight_violations(&document);

        assert!(violations.iter().any(|violation| violation.rule == "get_operations_presence"));
    }

    #[test]
    fn accepts_minimal_valid_openapi3_document() {
        let document = json!({ "openapi": "3.0.3", "paths": { "/cdns": { "get": {} } } });

        assert!(validate_openapi_preflight(&document).is_ok());
    }
}
