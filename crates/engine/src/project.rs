//! Projection of a matched item into data-source attributes.

use indexmap::IndexMap;
use specsource_types::{ItemPayload, ItemValue, Property, PropertyType, SchemaDefinition};

use crate::schema::is_reserved;

/// Copies item fields into output attributes keyed by field name.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultProjector;

impl ResultProjector {
    /// Projects `item` through the top-level properties of `schema`, skipping
    /// the identifier, a property named like the filter block and any
    /// property `skip` selects (parent identifiers).
    ///
    /// Fields absent from the item, or null, are left out. Scalars are
    /// normalized toward their declared type; objects and lists of objects
    /// are projected recursively through their nested schema.
    pub fn project(
        &self,
        item: &ItemPayload,
        schema: &SchemaDefinition,
        skip: impl Fn(&Property) -> bool,
    ) -> IndexMap<String, ItemValue> {
        schema
            .iter()
            .filter(|property| !schema.is_identifier(property) && !is_reserved(property) && !skip(property))
            .filter_map(|property| project_field(item, property))
            .collect()
    }
}

fn project_field(item: &ItemPayload, property: &Property) -> Option<(String, ItemValue)> {
    let value = item.get(&property.name).filter(|value| !value.is_null())?;
    Some((property.field_name(), project_value(value, property)))
}

/// Nested blocks keep every property, identifiers included.
fn project_block(item: &ItemPayload, schema: &SchemaDefinition) -> IndexMap<String, ItemValue> {
    schema
        .iter()
        .filter_map(|property| project_field(item, property))
        .collect()
}

fn project_value(value: &ItemValue, property: &Property) -> ItemValue {
    let Ok(kind) = property.property_type() else {
        return value.clone();
    };

    match (kind, value, property.nested.as_ref()) {
        (PropertyType::Object, ItemValue::Map(nested_item), Some(nested)) => {
            ItemValue::Map(project_block(nested_item, nested))
        }
        (PropertyType::Array, ItemValue::List(elements), nested) => {
            let items_kind = property.items_property_type().ok().flatten();
            ItemValue::List(
                elements
                    .iter()
                    .map(|element| match (items_kind, element, nested) {
                        (Some(PropertyType::Object), ItemValue::Map(nested_item), Some(nested)) => {
                            ItemValue::Map(project_block(nested_item, nested))
                        }
                        (Some(scalar), _, _) if scalar.is_primitive() => element.clone().into_declared(scalar),
                        _ => element.clone(),
                    })
                    .collect(),
            )
        }
        (scalar, _, _) if scalar.is_primitive() => value.clone().into_declared(scalar),
        _ => value.clone(),
    }
}
