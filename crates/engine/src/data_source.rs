//! Read orchestration for data sources.
//!
//! A [`DataSourceFactory`] binds one [`SpecResource`] and turns it into a
//! read-only data source: [`DataSourceFactory::schema`] describes what a
//! caller can query, [`DataSourceFactory::read`] resolves a request to
//! exactly one remote item.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use specsource_types::{ItemValue, SchemaDefinition, SpecResource};
use tracing::{debug, info};

use crate::error::DataSourceError;
use crate::filter::{Filter, extract_raw_filters, filter_match, validate_filters};
use crate::lister::{ListRequest, RemoteLister};
use crate::project::ResultProjector;
use crate::schema::{QueryableSchema, SchemaConverter};
use crate::telemetry::{TelemetryHandler, TelemetryOperation};

/// Request input and read output of a data source.
///
/// Callers place the filter block and parent identifiers in `attributes`; a
/// successful read sets `id` and adds the projected item attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    pub id: Option<String>,
    pub attributes: IndexMap<String, ItemValue>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<ItemValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ItemValue> {
        self.attributes.get(name)
    }
}

#[derive(Clone, Default)]
pub struct DataSourceFactory {
    resource: Option<Arc<dyn SpecResource>>,
}

impl DataSourceFactory {
    pub fn new(resource: Arc<dyn SpecResource>) -> Self {
        Self { resource: Some(resource) }
    }

    fn resource(&self) -> Result<&Arc<dyn SpecResource>, DataSourceError> {
        self.resource.as_ref().ok_or(DataSourceError::MissingResourceConfiguration)
    }

    fn resource_schema(resource: &dyn SpecResource) -> Result<SchemaDefinition, DataSourceError> {
        resource
            .resource_schema()
            .map_err(|error| DataSourceError::SchemaSource(DataSourceError::verbatim(&error)))
    }

    fn parent_property_names(resource: &dyn SpecResource) -> Vec<String> {
        resource
            .parent_resource_info()
            .map(|info| info.parent_property_names())
            .unwrap_or_default()
    }

    /// The queryable schema of the bound resource.
    pub fn schema(&self) -> Result<QueryableSchema, DataSourceError> {
        let resource = self.resource()?;
        let schema = Self::resource_schema(resource.as_ref())?;
        SchemaConverter.convert(&schema, &Self::parent_property_names(resource.as_ref()))
    }

    /// Extracts and validates the filters of `data`.
    pub fn validate_input(&self, data: &ResourceData) -> Result<Vec<Filter>, DataSourceError> {
        let resource = self.resource()?;
        let schema = Self::resource_schema(resource.as_ref())?;
        validate_filters(&extract_raw_filters(&data.attributes)?, &schema)
    }

    /// Resolves `data` to the single remote item matching its filters.
    ///
    /// On success `data.id` holds the item identifier and the item's fields
    /// are merged into `data.attributes`; on failure `data` is unchanged.
    /// Telemetry is only submitted for successful reads.
    pub async fn read(
        &self,
        data: &mut ResourceData,
        lister: &dyn RemoteLister,
        telemetry: &dyn TelemetryHandler,
    ) -> Result<(), DataSourceError> {
        let resource = self.resource()?.as_ref();
        let resource_name = resource.resource_name();

        let parent_properties = Self::parent_property_names(resource);
        let parent_ids = parent_properties
            .iter()
            .map(|property| parent_id(data, property))
            .collect::<Result<Vec<_>, _>>()?;
        let path = resource
            .resource_path(&parent_ids)
            .map_err(|error| DataSourceError::ParentResolution(DataSourceError::verbatim(&error)))?;

        let schema = Self::resource_schema(resource)?;
        let filters = validate_filters(&extract_raw_filters(&data.attributes)?, &schema)?;
        debug!(resource = %resource_name, path = %path, filter_count = filters.len(), "reading data source");

        let request = ListRequest {
            resource_name: resource_name.to_string(),
            path,
            parent_ids,
            response_path: resource.list_response_path().map(str::to_string),
        };
        let response = lister
            .list(&request)
            .await
            .map_err(|error| DataSourceError::Transport(DataSourceError::verbatim(&error)))?;
        if response.status_code != 200 {
            return Err(DataSourceError::unexpected_status(
                resource_name,
                &request.path,
                response.status_code,
                &response.body,
            ));
        }

        let candidate_count = response.items.len();
        let mut matches = response
            .items
            .into_iter()
            .filter(|item| filter_match(&filters, item, &schema));
        let item = match (matches.next(), matches.next()) {
            (Some(item), None) => item,
            (None, _) => return Err(DataSourceError::NoResults),
            (Some(_), Some(_)) => return Err(DataSourceError::AmbiguousResult),
        };

        let identifier_name = schema
            .identifier_property()
            .map(|property| property.name.clone())
            .unwrap_or_else(|| "id".to_string());
        let id = item
            .get(&identifier_name)
            .and_then(ItemValue::canonical_text)
            .ok_or_else(|| DataSourceError::MissingIdentifier(identifier_name.clone()))?;

        let projected = ResultProjector.project(&item, &schema, |property| {
            property.is_parent_property || parent_properties.contains(&property.name)
        });

        data.id = Some(id);
        data.attributes.extend(projected);
        info!(resource = %resource_name, candidate_count, id = ?data.id, "data source read completed");

        telemetry.submit(&resource.data_source_name(), TelemetryOperation::Read);
        Ok(())
    }
}

fn parent_id(data: &ResourceData, property: &str) -> Result<String, DataSourceError> {
    data.get(property)
        .and_then(ItemValue::canonical_text)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            DataSourceError::ParentResolution(format!(
                "could not find ID value in the state file for subresource parent property '{}'",
                property
            ))
        })
}
