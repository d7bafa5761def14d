use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use specsource_types::{DATA_SOURCE_NAME_PREFIX, SpecResource};
use specsource_util::openapi_validation::collect_openapi_preflight_violations;
use tracing::info;

use crate::openapi::{discover_resources, document_base_url, parse_openapi_document};
use crate::resource::OpenApiResource;

/// The resources discovered in one OpenAPI document.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    resources: Vec<OpenApiResource>,
    base_url: Option<String>,
}

impl ResourceCatalog {
    /// Reads and loads the OpenAPI document at `path` (JSON or YAML).
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("failed to read OpenAPI document {}", path.display()))?;
        Self::from_source(&content).with_context(|| format!("failed to load OpenAPI document {}", path.display()))
    }

    pub fn from_source(source_content: &str) -> Result<Self> {
        let document = parse_openapi_document(source_content)?;
        Self::from_document(&document)
    }

    /// Validates the document and discovers its resources.
    pub fn from_document(document: &Value) -> Result<Self> {
        let violations = collect_openapi_preflight_violations(document);
        if !violations.is_empty() {
            let details = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(anyhow!("OpenAPI source failed preflight validation: {}", details));
        }

        let resources = discover_resources(document)?;
        info!(resource_count = resources.len(), "loaded OpenAPI resources");
        Ok(Self {
            resources,
            base_url: document_base_url(document),
        })
    }

    pub fn resources(&self) -> &[OpenApiResource] {
        &self.resources
    }

    /// Finds a resource by name; the data-source form (`data_<name>`) is accepted too.
    pub fn find(&self, name: &str) -> Option<&OpenApiResource> {
        let bare_name = name.strip_prefix(DATA_SOURCE_NAME_PREFIX).unwrap_or(name);
        self.resources
            .iter()
            .find(|resource| resource.resource_name() == name)
            .or_else(|| self.resources.iter().find(|resource| resource.resource_name() == bare_name))
    }

    /// Resource names in document order.
    pub fn list_names(&self) -> Vec<String> {
        self.resources
            .iter()
            .map(|resource| resource.resource_name().to_string())
            .collect()
    }

    /// The absolute base URL the document advertises, if any.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}
