//! `$ref`-aware helpers for walking JSON schemas embedded in OpenAPI documents.
//!
//! All recursive walks share a [`SchemaResolutionContext`] that bounds depth
//! and short-circuits `$ref` pointers already on the active resolution path,
//! so self-referential and mutually recursive schemas terminate.

use serde_json::{Map, Value};
use std::collections::HashSet;

pub const MAX_SCHEMA_RESOLUTION_DEPTH: usize = 128;

#[derive(Debug, Default)]
pub struct SchemaResolutionContext {
    depth: usize,
    visited_references: HashSet<String>,
}

/// Runs `resolver` inside a resolution frame for `maybe_reference`, or
/// `fallback` when the depth bound is hit or the reference is already active.
pub fn with_resolution_frame<T, FResolver, FFallback>(
    context: &mut SchemaResolutionContext,
    maybe_reference: Option<&str>,
    fallback: FFallback,
    resolver: FResolver,
) -> T
where
    FResolver: FnOnce(&mut SchemaResolutionContext) -> T,
    FFallback: FnOnce() -> T,
{
    if context.depth >= MAX_SCHEMA_RESOLUTION_DEPTH {
        return fallback();
    }

    let normalized_reference = maybe_reference.map(normalize_reference);
    if let Some(reference) = normalized_reference.as_ref()
        && !context.visited_references.insert(reference.clone())
    {
        return fallback();
    }

    context.depth += 1;
    let result = resolver(context);
    context.depth -= 1;

    if let Some(reference) = normalized_reference {
        context.visited_references.remove(&reference);
    }

    result
}

fn normalize_reference(reference: &str) -> String {
    reference.strip_prefix('#').unwrap_or(reference).to_string()
}

/// Returns the `$ref` pointer of a schema node, if any.
pub fn schema_reference(schema: &Value) -> Option<&str> {
    schema.get("$ref").and_then(Value::as_str)
}

/// Resolves a local reference such as `#/components/schemas/Cdn`.
pub fn resolve_local_ref<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    root.pointer(&normalize_reference(reference))
}

/// Follows a chain of `$ref` pointers to the first non-reference schema.
///
/// Unresolvable or cyclic chains stop at the last schema reached.
pub fn dereference<'a>(schema: &'a Value, root: &'a Value) -> &'a Value {
    let mut current = schema;
    let mut seen = HashSet::new();
    while let Some(reference) = schema_reference(current) {
        if seen.len() >= MAX_SCHEMA_RESOLUTION_DEPTH || !seen.insert(normalize_reference(reference)) {
            break;
        }
        match resolve_local_ref(root, reference) {
            Some(target) => current = target,
            None => break,
        }
    }
    current
}

/// Returns the object map of a schema, following one level of `$ref`.
pub fn resolve_schema_map<'a>(schema: &'a Value, root: &'a Value) -> Option<&'a Map<String, Value>> {
    if let Some(reference) = schema_reference(schema) {
        return resolve_local_ref(root, reference).and_then(Value::as_object);
    }

    schema.as_object()
}

/// Recursively resolves the description from a schema, following `$ref` or combining `anyOf`/`oneOf`/`allOf`.
pub fn get_description(schema: &Value, root: &Value) -> Option<String> {
    let mut context = SchemaResolutionContext::default();
    get_description_internal(schema, root, &mut context)
}

fn get_description_internal(schema: &Value, root: &Value, context: &mut SchemaResolutionContext) -> Option<String> {
    let reference = schema_reference(schema);

    with_resolution_frame(
        context,
        reference,
        || None,
        |context| {
            if let Some(reference) = reference {
                return resolve_local_ref(root, reference).and_then(|target| get_description_internal(target, root, context));
            }

            if let Some(description) = schema.get("description").and_then(Value::as_str) {
                return Some(description.to_string());
            }

            for (key, separator) in [("anyOf", " or "), ("oneOf", " or "), ("allOf", " and ")] {
                if let Some(array) = schema.get(key).and_then(Value::as_array) {
                    let descriptions: Vec<String> = array
                        .iter()
                        .filter_map(|item| get_description_internal(item, root, context))
                        .collect();
                    if !descriptions.is_empty() {
                        return Some(descriptions.join(separator));
                    }
                }
            }

            None
        },
    )
}

/// Recursively resolves the type from a schema, handling `$ref`, direct types,
/// nullable type arrays and single-typed `anyOf`/`oneOf`/`allOf` unions.
///
/// Schemas that declare `properties` without a `type` resolve to `object`;
/// anything undecidable defaults to `string`.
pub fn get_type(schema: &Value, root: &Value) -> String {
    let mut context = SchemaResolutionContext::default();
    get_type_internal(schema, root, &mut context)
}

fn get_type_internal(schema: &Value, root: &Value, context: &mut SchemaResolutionContext) -> String {
    let reference = schema_reference(schema);

    with_resolution_frame(
        context,
        reference,
        || "string".to_string(),
        |context| {
            if let Some(reference) = reference {
                return resolve_local_ref(root, reference).map_or("string".to_string(), |target| get_type_internal(target, root, context));
            }

            if let Some(schema_type) = schema.get("type") {
                if let Some(schema_type_name) = schema_type.as_str() {
                    return schema_type_name.to_string();
                }
                if let Some(type_array) = schema_type.as_array() {
                    let types: HashSet<String> = type_array
                        .iter()
                        .filter_map(|value| value.as_str().map(str::to_string))
                        .filter(|type_name| type_name != "null")
                        .collect();
                    if types.len() == 1 {
                        return types.into_iter().next().unwrap_or_else(|| "string".to_string());
                    }
                }
            }

            if schema.get("properties").is_some() {
                return "object".to_string();
            }

            for key in ["anyOf", "oneOf", "allOf"] {
                if let Some(array) = schema.get(key).and_then(Value::as_array) {
                    let types: HashSet<String> = array.iter().map(|item| get_type_internal(item, root, context)).collect();
                    if types.len() == 1 {
                        return types.into_iter().next().unwrap_or_else(|| "string".to_string());
                    }
                }
            }

            "string".to_string()
        },
    )
}

/// Collects the `required` names of an object schema.
pub fn required_names(schema_map: &Map<String, Value>) -> Vec<String> {
    schema_map
        .get("required")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}
