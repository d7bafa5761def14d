use anyhow::Result;
use specsource_types::{ParentResourceInfo, SchemaDefinition, SpecResource};
use specsource_util::resolve_path_in_order;

/// A listable collection discovered in an OpenAPI document.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiResource {
    name: String,
    path: String,
    schema: SchemaDefinition,
    parent_info: Option<ParentResourceInfo>,
    list_response_path: Option<String>,
    summary: Option<String>,
}

impl OpenApiResource {
    pub fn new(
        name: String,
        path: String,
        schema: SchemaDefinition,
        parent_info: Option<ParentResourceInfo>,
        list_response_path: Option<String>,
        summary: Option<String>,
    ) -> Self {
        Self {
            name,
            path,
            schema,
            parent_info,
            list_response_path,
            summary,
        }
    }

    /// The path template, placeholders included (`/v1/cdns/{id}/firewall`).
    pub fn path_template(&self) -> &str {
        &self.path
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

impl SpecResource for OpenApiResource {
    fn resource_name(&self) -> &str {
        &self.name
    }

    fn resource_schema(&self) -> Result<SchemaDefinition> {
        Ok(self.schema.clone())
    }

    fn parent_resource_info(&self) -> Option<&ParentResourceInfo> {
        self.parent_info.as_ref()
    }

    fn resource_path(&self, parent_ids: &[String]) -> Result<String> {
        Ok(resolve_path_in_order(&self.path, parent_ids)?)
    }

    fn list_response_path(&self) -> Option<&str> {
        self.list_response_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specsource_types::Property;

    #[test]
    fn resource_path_reports_wrong_parent_id_count() {
        let resource = OpenApiResource::new(
            "cdns_v1_firewall".into(),
            "/v1/cdns/{id}/firewall".into(),
            SchemaDefinition::new(vec![Property::string("id")]),
            None,
            None,
            None,
        );

        assert_eq!(resource.data_source_name(), "data_cdns_v1_firewall");
        let error = resource.resource_path(&[]).unwrap_err();
        assert!(error.to_string().contains("'/v1/cdns/{id}/firewall'"), "error: {error}");
    }
}
