//! OpenAPI resource discovery.
//!
//! Turns OpenAPI v2 (Swagger) and v3 documents into [`OpenApiResource`]s: one
//! per collection path whose `GET` operation lists objects, with the item
//! schema converted into a [`SchemaDefinition`].

use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use heck::ToSnakeCase;
use serde_json::{Map, Value};
use specsource_types::{ItemValue, ParentResourceInfo, Property, PropertyType, SchemaDefinition};
use specsource_util::RESPONSE_ARRAY_PRIORITY_KEYS;
use specsource_util::schema::{
    SchemaResolutionContext, dereference, get_description, get_type, required_names, resolve_local_ref, schema_reference,
    with_resolution_frame,
};
use tracing::debug;

use crate::resource::OpenApiResource;

/// Extension marking the identifier property of an item schema.
pub const IDENTIFIER_EXTENSION: &str = "x-identifier";
/// Extension overriding the derived output field name of a property.
pub const FIELD_NAME_EXTENSION: &str = "x-field-name";

// ============================================================================
// Document Parsing
// ============================================================================

/// Parses OpenAPI source text, trying JSON first and YAML second.
pub fn parse_openapi_document(source_content: &str) -> Result<Value> {
    serde_json::from_str::<Value>(source_content)
        .or_else(|_| serde_yaml::from_str::<Value>(source_content))
        .map_err(|error| anyhow!("source content is not valid JSON or YAML: {}", error))
}

/// Determines if a document is OpenAPI v3 based on the presence of an "openapi" field.
fn is_oas3(document: &Value) -> bool {
    document.get("openapi").and_then(Value::as_str).is_some()
}

/// Base URL advertised by the document, if it declares an absolute one.
///
/// v3 documents use the first `servers` entry; v2 documents combine the first
/// of `schemes` (default `https`) with `host`.
pub fn document_base_url(document: &Value) -> Option<String> {
    if is_oas3(document) {
        return document
            .pointer("/servers/0/url")
            .and_then(Value::as_str)
            .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
            .map(|url| url.trim_end_matches('/').to_string());
    }

    let host = document.get("host").and_then(Value::as_str)?;
    let scheme = document.pointer("/schemes/0").and_then(Value::as_str).unwrap_or("https");
    Some(format!("{}://{}", scheme, host.trim_end_matches('/')))
}

// ============================================================================
// Resource Discovery
// ============================================================================

/// Discovers listable resources in document order.
///
/// Paths whose name collides with an earlier resource are skipped.
pub fn discover_resources(document: &Value) -> Result<Vec<OpenApiResource>> {
    let paths = document
        .get("paths")
        .and_then(Value::as_object)
        .context("OpenAPI document has no `paths` object")?;
    let base_path = if is_oas3(document) {
        ""
    } else {
        document
            .get("basePath")
            .and_then(Value::as_str)
            .map(|base| base.trim_end_matches('/'))
            .unwrap_or("")
    };

    let mut resources: Vec<OpenApiResource> = Vec::new();
    let mut seen_names = HashSet::new();
    for (path, path_item) in paths {
        let Some(operation) = path_item.get("get") else {
            continue;
        };
        let Some((resource_name, parent_info)) = derive_resource_names(path) else {
            debug!(path = %path, "skipping path that is not a collection");
            continue;
        };
        let Some(response_schema) = list_response_schema(document, operation) else {
            debug!(path = %path, "skipping GET without a JSON 200 response schema");
            continue;
        };
        let Some((item_schema, list_response_path)) = collection_item_schema(response_schema, document) else {
            debug!(path = %path, "skipping GET whose response is not a list of objects");
            continue;
        };
        if !seen_names.insert(resource_name.clone()) {
            debug!(path = %path, resource = %resource_name, "skipping duplicate resource name");
            continue;
        }

        let mut context = SchemaResolutionContext::default();
        let mut schema = object_schema(item_schema, document, &mut context);
        if let Some(info) = parent_info.as_ref() {
            for parent_property in info.parent_property_names() {
                if schema.property(&parent_property).is_none() {
                    schema
                        .properties
                        .push(Property::string(parent_property).required().parent_property());
                }
            }
        }

        let summary = operation
            .get("summary")
            .or_else(|| operation.get("description"))
            .and_then(Value::as_str)
            .map(str::to_string);

        debug!(
            resource = %resource_name,
            path = %path,
            property_count = schema.properties.len(),
            "discovered resource"
        );
        resources.push(OpenApiResource::new(
            resource_name,
            format!("{}{}", base_path, path),
            schema,
            parent_info,
            list_response_path,
            summary,
        ));
    }

    Ok(resources)
}

/// Derives the resource name and parent information from a path template.
///
/// The segment right before a placeholder (or the end of the path) names a
/// collection, suffixed with a preceding version segment when present:
///
/// - `/v1/cdns` -> `cdns_v1`
/// - `/v1/cdns/{id}/firewall` -> `cdns_v1_firewall`, parent `cdns_v1`
///
/// Paths ending in a placeholder address single items and yield `None`.
pub fn derive_resource_names(path: &str) -> Option<(String, Option<ParentResourceInfo>)> {
    let mut pending_version: Option<&str> = None;
    let mut candidate: Option<String> = None;
    let mut full_name: Option<String> = None;
    let mut parents = Vec::new();

    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        if segment.starts_with('{') && segment.ends_with('}') {
            let collection = candidate.take()?;
            let parent_name = join_name(full_name.take(), collection);
            parents.push(parent_name.clone());
            full_name = Some(parent_name);
            pending_version = None;
        } else if is_version_segment(segment) {
            pending_version = Some(segment);
        } else {
            let collection = segment.to_snake_case();
            candidate = Some(match pending_version.take() {
                Some(version) => format!("{}_{}", collection, version),
                None => collection,
            });
        }
    }

    let resource_name = join_name(full_name.clone(), candidate?);
    let parent_info = full_name.map(|full_parent_resource_name| ParentResourceInfo {
        parent_resource_names: parents,
        full_parent_resource_name,
    });
    Some((resource_name, parent_info))
}

fn join_name(prefix: Option<String>, name: String) -> String {
    match prefix {
        Some(prefix) => format!("{}_{}", prefix, name),
        None => name,
    }
}

fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

/// Schema of the JSON body returned with status 200 by a `GET` operation.
fn list_response_schema<'a>(document: &'a Value, operation: &'a Value) -> Option<&'a Value> {
    let response = operation.get("responses")?.get("200")?;
    let response = dereference(response, document);

    if !is_oas3(document) {
        return response.get("schema");
    }

    let content = response.get("content")?.as_object()?;
    content
        .get("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(media_type, _)| media_type.contains("json"))
                .map(|(_, media)| media)
        })?
        .get("schema")
}

/// Locates the item schema of a listing response: a top-level array of
/// objects, or an array of objects under a wrapper property. The wrapper
/// property name is returned alongside.
fn collection_item_schema<'a>(response_schema: &'a Value, document: &'a Value) -> Option<(&'a Value, Option<String>)> {
    let resolved = dereference(response_schema, document);
    if get_type(resolved, document) == "array" {
        let items = resolved.get("items")?;
        return is_object_schema(items, document).then_some((items, None));
    }

    let properties = resolved.get("properties")?.as_object()?;
    let object_arrays: Vec<(&String, &Value)> = properties
        .iter()
        .filter_map(|(name, schema)| {
            let schema = dereference(schema, document);
            if get_type(schema, document) != "array" {
                return None;
            }
            let items = schema.get("items")?;
            is_object_schema(items, document).then_some((name, items))
        })
        .collect();

    let chosen = RESPONSE_ARRAY_PRIORITY_KEYS
        .iter()
        .find_map(|key| object_arrays.iter().find(|(name, _)| name.as_str() == *key))
        .or_else(|| (object_arrays.len() == 1).then(|| &object_arrays[0]))?;
    Some((chosen.1, Some(chosen.0.clone())))
}

fn is_object_schema(schema: &Value, document: &Value) -> bool {
    get_type(schema, document) == "object"
}

// ============================================================================
// Property Conversion
// ============================================================================

#[derive(Default)]
struct ObjectMembers<'a> {
    properties: Vec<(&'a str, &'a Value)>,
    required: HashSet<String>,
}

/// Converts an object schema (following `$ref` and `allOf`) into a
/// [`SchemaDefinition`]. Cyclic references resolve to an empty definition.
fn object_schema(schema: &Value, root: &Value, context: &mut SchemaResolutionContext) -> SchemaDefinition {
    let reference = schema_reference(schema);
    with_resolution_frame(context, reference, SchemaDefinition::default, |context| {
        if let Some(reference) = reference {
            return resolve_local_ref(root, reference)
                .map(|target| object_schema(target, root, context))
                .unwrap_or_default();
        }

        let mut members = ObjectMembers::default();
        collect_object_members(schema, root, context, &mut members);
        let properties = members
            .properties
            .iter()
            .map(|(name, property_schema)| {
                property_from_schema(name, property_schema, members.required.contains(*name), root, context)
            })
            .collect();
        SchemaDefinition::new(properties)
    })
}

fn collect_object_members<'a>(
    schema: &'a Value,
    root: &'a Value,
    context: &mut SchemaResolutionContext,
    members: &mut ObjectMembers<'a>,
) {
    let reference = schema_reference(schema);
    with_resolution_frame(
        context,
        reference,
        || (),
        |context| {
            if let Some(reference) = reference {
                if let Some(target) = resolve_local_ref(root, reference) {
                    collect_object_members(target, root, context, members);
                }
                return;
            }

            let Some(schema_map) = schema.as_object() else {
                return;
            };
            members.required.extend(required_names(schema_map));
            if let Some(properties) = schema_map.get("properties").and_then(Value::as_object) {
                for (name, property_schema) in properties {
                    if !members.properties.iter().any(|(existing, _)| *existing == name.as_str()) {
                        members.properties.push((name.as_str(), property_schema));
                    }
                }
            }
            if let Some(all_of) = schema_map.get("allOf").and_then(Value::as_array) {
                for member in all_of {
                    collect_object_members(member, root, context, members);
                }
            }
        },
    );
}

fn property_from_schema(
    name: &str,
    schema: &Value,
    required: bool,
    root: &Value,
    context: &mut SchemaResolutionContext,
) -> Property {
    let declared_type = get_type(schema, root);
    let keywords = keyword_lookup(schema, root);

    let mut property = Property::new(name, declared_type.clone());
    property.required = required;
    property.read_only = keywords("readOnly").and_then(Value::as_bool).unwrap_or(false);
    property.computed = property.read_only;
    property.is_identifier = keywords(IDENTIFIER_EXTENSION).and_then(Value::as_bool).unwrap_or(false);
    property.preferred_name = keywords(FIELD_NAME_EXTENSION)
        .and_then(Value::as_str)
        .map(str::to_string);
    property.description = get_description(schema, root);
    property.default = keywords("default").cloned().map(ItemValue::from);

    match declared_type.parse::<PropertyType>() {
        Ok(PropertyType::Object) => {
            property.nested = Some(object_schema(schema, root, context));
        }
        Ok(PropertyType::Array) => {
            if let Some(items) = keywords("items") {
                let items_type = get_type(items, root);
                if items_type == PropertyType::Object.as_str() {
                    property.nested = Some(object_schema(items, root, context));
                }
                property.items_type = Some(items_type);
            }
        }
        _ => {}
    }

    property
}

/// Looks keywords up on the schema itself first, then on the schema its
/// `$ref` chain resolves to.
fn keyword_lookup<'a>(schema: &'a Value, root: &'a Value) -> impl Fn(&str) -> Option<&'a Value> {
    let resolved: Option<&'a Map<String, Value>> = dereference(schema, root).as_object();
    move |key| schema.get(key).or_else(|| resolved.and_then(|map| map.get(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use specsource_types::SpecResource;

    #[test]
    fn derive_resource_names_handles_versions_and_parents() {
        assert_eq!(derive_resource_names("/v1/cdns"), Some(("cdns_v1".to_string(), None)));
        assert_eq!(derive_resource_names("/cdns"), Some(("cdns".to_string(), None)));
        assert_eq!(derive_resource_names("/v1/cdns/{id}"), None);
        assert_eq!(derive_resource_names("/{tenant}/cdns"), None);

        let (name, parent_info) = derive_resource_names("/v1/cdns/{cdn_id}/v1/firewalls/{id}/rules").unwrap();
        assert_eq!(name, "cdns_v1_firewalls_v1_rules");
        let parent_info = parent_info.unwrap();
        assert_eq!(parent_info.parent_resource_names, vec!["cdns_v1", "cdns_v1_firewalls_v1"]);
        assert_eq!(parent_info.full_parent_resource_name, "cdns_v1_firewalls_v1");
    }

    #[test]
    fn discovers_wrapped_listing_and_converts_nested_schemas() {
        let document = json!({
            "openapi": "3.0.3",
            "paths": {
                "/v1/cdns": {
                    "get": {
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "meta": { "type": "array", "items": { "type": "string" } },
                                                "items": { "type": "array", "items": { "$ref": "#/components/schemas/Cdn" } }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Cdn": {
                        "type": "object",
                        "required": ["label"],
                        "properties": {
                            "id": { "type": "string", "readOnly": true, "x-identifier": true },
                            "label": { "type": "string", "description": "display label" },
                            "originPort": { "type": "integer", "default": 80 },
                            "origin": { "$ref": "#/components/schemas/Origin" },
                            "parent": { "$ref": "#/components/schemas/Cdn" }
                        }
                    },
                    "Origin": {
                        "type": "object",
                        "properties": { "host": { "type": "string" } }
                    }
                }
            }
        });

        let resources = discover_resources(&document).unwrap();
        assert_eq!(resources.len(), 1);
        let resource = &resources[0];
        assert_eq!(resource.resource_name(), "cdns_v1");
        assert_eq!(resource.list_response_path(), Some("items"));

        let schema = resource.resource_schema().unwrap();
        let identifier = schema.identifier_property().unwrap();
        assert_eq!(identifier.name, "id");
        assert!(identifier.read_only && identifier.computed);
        let label = schema.property("label").unwrap();
        assert!(label.required);
        assert_eq!(label.description.as_deref(), Some("display label"));
        assert_eq!(schema.property("originPort").unwrap().default, Some(ItemValue::Integer(80)));

        let origin = schema.property("origin").unwrap();
        assert_eq!(origin.r#type, "object");
        assert!(origin.nested.as_ref().unwrap().property("host").is_some());

        let parent = schema.property("parent").unwrap();
        assert!(parent.nested.as_ref().unwrap().is_empty());
    }

    #[test]
    fn discovers_swagger_sub_resources_with_parent_properties() {
        let document = json!({
            "swagger": "2.0",
            "basePath": "/api",
            "paths": {
                "/v1/cdns/{id}/firewall": {
                    "get": {
                        "responses": {
                            "200": {
                                "schema": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "id": { "type": "string" },
                                            "ports": { "type": "array", "items": { "type": "integer" } }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/v1/cdns/{id}": { "get": { "responses": { "200": { "schema": { "type": "object" } } } } }
            }
        });

        let resources = discover_resources(&document).unwrap();
        assert_eq!(resources.len(), 1);
        let resource = &resources[0];
        assert_eq!(resource.resource_name(), "cdns_v1_firewall");
        assert_eq!(resource.resource_path(&["cdn-1".to_string()]).unwrap(), "/api/v1/cdns/cdn-1/firewall");

        let schema = resource.resource_schema().unwrap();
        let parent_property = schema.property("cdns_v1_id").unwrap();
        assert!(parent_property.is_parent_property && parent_property.required);
        assert_eq!(schema.property("ports").unwrap().items_type.as_deref(), Some("integer"));
    }

    #[test]
    fn document_base_url_reads_servers_or_host() {
        let v3 = json!({ "openapi": "3.0.0", "servers": [{ "url": "https://api.example.com/" }] });
        assert_eq!(document_base_url(&v3).as_deref(), Some("https://api.example.com"));

        let relative = json!({ "openapi": "3.0.0", "servers": [{ "url": "/api" }] });
        assert_eq!(document_base_url(&relative), None);

        let v2 = json!({ "swagger": "2.0", "host": "localhost:8080", "schemes": ["http"] });
        assert_eq!(document_base_url(&v2).as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn parse_openapi_document_accepts_yaml() {
        let document = parse_openapi_document("openapi: 3.0.0\npaths: {}\n").unwrap();
        assert_eq!(document["openapi"], json!("3.0.0"));
        assert!(parse_openapi_document("{ not: [valid").is_err());
    }
}
