use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::schema::SchemaDefinition;

/// Prefix applied to a resource name to form its data-source name.
pub const DATA_SOURCE_NAME_PREFIX: &str = "data_";

/// Suffix appended to a parent resource name to form the parent-id property.
pub const PARENT_PROPERTY_SUFFIX: &str = "_id";

/// Describes the parents of a sub-resource such as `/v1/cdns/{id}/firewall`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentResourceInfo {
    /// Parent resource names, outermost first (e.g. `["cdns_v1"]`)
    pub parent_resource_names: Vec<String>,
    /// Name of the immediate parent including its own ancestors
    pub full_parent_resource_name: String,
}

impl ParentResourceInfo {
    /// Names of the properties carrying each parent's identifier, in path order.
    pub fn parent_property_names(&self) -> Vec<String> {
        self.parent_resource_names
            .iter()
            .map(|name| format!("{name}{PARENT_PROPERTY_SUFFIX}"))
            .collect()
    }
}

/// A remote resource collection whose shape is described by a schema.
///
/// Implemented by schema sources (for example an OpenAPI document loader) and
/// consumed read-only by the data-source engine.
pub trait SpecResource: Send + Sync {
    fn resource_name(&self) -> &str;

    /// The abstract property schema of one collection item.
    fn resource_schema(&self) -> Result<SchemaDefinition>;

    /// Parent information when this is a sub-resource.
    fn parent_resource_info(&self) -> Option<&ParentResourceInfo> {
        None
    }

    /// Resolves the collection path with the given parent identifiers, in
    /// the order the parents appear in the path.
    fn resource_path(&self, parent_ids: &[String]) -> Result<String>;

    /// Dot-separated location of the item array inside a wrapped listing
    /// response (`"page.items"`); `None` lets the lister probe the body.
    fn list_response_path(&self) -> Option<&str> {
        None
    }

    /// The qualified name used when reporting data-source activity.
    fn data_source_name(&self) -> String {
        format!("{DATA_SOURCE_NAME_PREFIX}{}", self.resource_name())
    }
}
