//! Conversion of an abstract [`SchemaDefinition`] into the queryable schema
//! a data source exposes.

use indexmap::IndexMap;
use serde::Serialize;
use specsource_types::{Property, PropertyType, SchemaDefinition};

use crate::error::DataSourceError;
use crate::filter::{FILTER_NAME_FIELD, FILTER_PROPERTY_NAME, FILTER_VALUES_FIELD};

/// Kind of a queryable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    List,
    Object,
}

impl From<PropertyType> for FieldType {
    fn from(kind: PropertyType) -> Self {
        match kind {
            PropertyType::String => Self::String,
            PropertyType::Integer => Self::Integer,
            PropertyType::Number => Self::Number,
            PropertyType::Boolean => Self::Boolean,
            PropertyType::Array => Self::List,
            PropertyType::Object => Self::Object,
        }
    }
}

/// Element of a list or object field: scalar elements or a nested block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldElement {
    Scalar(FieldType),
    Block(IndexMap<String, FieldSchema>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elem: Option<FieldElement>,
}

impl FieldSchema {
    fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            optional: false,
            computed: false,
            max_items: None,
            description: None,
            elem: None,
        }
    }

    fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The nested block of an object or list-of-object field.
    pub fn block(&self) -> Option<&IndexMap<String, FieldSchema>> {
        match self.elem.as_ref() {
            Some(FieldElement::Block(fields)) => Some(fields),
            _ => None,
        }
    }
}

/// Fields a data source exposes: resource attributes (computed), parent
/// identifiers (required) and the `filter` block, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryableSchema {
    pub fields: IndexMap<String, FieldSchema>,
}

impl QueryableSchema {
    pub fn get(&self, field_name: &str) -> Option<&FieldSchema> {
        self.fields.get(field_name)
    }

    pub fn contains(&self, field_name: &str) -> bool {
        self.fields.contains_key(field_name)
    }
}

/// Maps schema definitions to queryable schemas.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaConverter;

impl SchemaConverter {
    /// Converts `schema` and appends the filter block.
    ///
    /// The identifier property is left out since reads report it separately,
    /// as is any property whose field name is the reserved `filter`.
    /// Properties named in `parent_properties` (or flagged as parent
    /// properties) become required inputs; every other field is computed.
    pub fn convert(&self, schema: &SchemaDefinition, parent_properties: &[String]) -> Result<QueryableSchema, DataSourceError> {
        let mut fields = IndexMap::new();
        for property in schema.iter() {
            if schema.is_identifier(property) || is_reserved(property) {
                continue;
            }
            let is_parent = property.is_parent_property || parent_properties.contains(&property.name);
            let field = if is_parent {
                convert_property(property)?.required()
            } else {
                convert_property(property)?.computed()
            };
            fields.insert(property.field_name(), field);
        }
        fields.insert(FILTER_PROPERTY_NAME.to_string(), filter_field());
        Ok(QueryableSchema { fields })
    }
}

/// Top-level properties whose field name collides with the filter block.
pub(crate) fn is_reserved(property: &Property) -> bool {
    property.field_name() == FILTER_PROPERTY_NAME
}

fn convert_property(property: &Property) -> Result<FieldSchema, DataSourceError> {
    let kind = property
        .property_type()
        .map_err(|error| DataSourceError::UnsupportedType(error.0))?;

    let mut field = FieldSchema::new(kind.into());
    field.description = property.description.clone();
    match kind {
        PropertyType::Object => {
            field.max_items = Some(1);
            let nested = property.nested.as_ref().map(convert_block).transpose()?.unwrap_or_default();
            field.elem = Some(FieldElement::Block(nested));
        }
        PropertyType::Array => {
            field.elem = Some(list_element(property)?);
        }
        _ => {}
    }
    Ok(field)
}

fn list_element(property: &Property) -> Result<FieldElement, DataSourceError> {
    let unsupported = || DataSourceError::UnsupportedListItemType {
        name: property.name.clone(),
        items: property.items_type.clone().unwrap_or_default(),
    };

    match property.items_property_type().map_err(|_| unsupported())? {
        None => Ok(FieldElement::Scalar(FieldType::String)),
        Some(PropertyType::Object) => {
            let nested = property.nested.as_ref().map(convert_block).transpose()?.unwrap_or_default();
            Ok(FieldElement::Block(nested))
        }
        Some(PropertyType::Array) => Err(unsupported()),
        Some(scalar) => Ok(FieldElement::Scalar(scalar.into())),
    }
}

/// Nested blocks keep every property, identifiers included.
fn convert_block(schema: &SchemaDefinition) -> Result<IndexMap<String, FieldSchema>, DataSourceError> {
    schema
        .iter()
        .map(|property| -> Result<(String, FieldSchema), DataSourceError> {
            Ok((property.field_name(), convert_property(property)?.computed()))
        })
        .collect()
}

fn filter_field() -> FieldSchema {
    let mut block = IndexMap::new();
    block.insert(FILTER_NAME_FIELD.to_string(), FieldSchema::new(FieldType::String).required());
    let mut values = FieldSchema::new(FieldType::List).required();
    values.elem = Some(FieldElement::Scalar(FieldType::String));
    block.insert(FILTER_VALUES_FIELD.to_string(), values);

    let mut filter = FieldSchema::new(FieldType::List);
    filter.optional = true;
    filter.elem = Some(FieldElement::Block(block));
    filter
}
