//! Filter extraction, validation and matching.
//!
//! Callers describe filters as a repeatable `filter` block of
//! `{ name, values: [...] }` entries. Validation narrows each entry to a
//! single [`Filter`] bound to a scalar top-level property; matching then
//! compares item fields textually under [`ItemValue::filter_text`].

use indexmap::IndexMap;
use specsource_types::{ItemPayload, ItemValue, SchemaDefinition};

use crate::error::DataSourceError;

/// Name of the synthetic filter block in the queryable schema and request input.
pub const FILTER_PROPERTY_NAME: &str = "filter";
/// Sub-field carrying the property a filter targets.
pub const FILTER_NAME_FIELD: &str = "name";
/// Sub-field carrying the expected values of a filter.
pub const FILTER_VALUES_FIELD: &str = "values";

/// One entry of the caller's filter block, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilter {
    pub name: String,
    pub values: Vec<String>,
}

impl RawFilter {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// The request-input representation of this entry.
    pub fn to_item_value(&self) -> ItemValue {
        let mut entry = IndexMap::new();
        entry.insert(FILTER_NAME_FIELD.to_string(), ItemValue::String(self.name.clone()));
        entry.insert(
            FILTER_VALUES_FIELD.to_string(),
            ItemValue::List(self.values.iter().cloned().map(ItemValue::String).collect()),
        );
        ItemValue::Map(entry)
    }
}

/// A validated, single-valued filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub value: String,
}

/// Reads the filter block out of request attributes.
///
/// A missing or null block means no filters. Values may be given as any
/// scalar and are kept in their canonical text form.
pub fn extract_raw_filters(attributes: &IndexMap<String, ItemValue>) -> Result<Vec<RawFilter>, DataSourceError> {
    let entries = match attributes.get(FILTER_PROPERTY_NAME) {
        None | Some(ItemValue::Null) => return Ok(Vec::new()),
        Some(ItemValue::List(entries)) => entries,
        Some(other) => {
            return Err(DataSourceError::InvalidFilterInput(format!(
                "'{}' must be a list of blocks, got {}",
                FILTER_PROPERTY_NAME,
                other.kind_name()
            )));
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| raw_filter_from_entry(index, entry))
        .collect()
}

fn raw_filter_from_entry(index: usize, entry: &ItemValue) -> Result<RawFilter, DataSourceError> {
    let Some(block) = entry.as_map() else {
        return Err(DataSourceError::InvalidFilterInput(format!(
            "filter entry #{} must be a block, got {}",
            index,
            entry.kind_name()
        )));
    };

    let name = block
        .get(FILTER_NAME_FIELD)
        .and_then(ItemValue::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            DataSourceError::InvalidFilterInput(format!("filter entry #{} is missing '{}'", index, FILTER_NAME_FIELD))
        })?;

    let values = match block.get(FILTER_VALUES_FIELD) {
        None | Some(ItemValue::Null) => Vec::new(),
        Some(ItemValue::List(values)) => values
            .iter()
            .map(|value| {
                value.canonical_text().ok_or_else(|| {
                    DataSourceError::InvalidFilterInput(format!(
                        "filter '{}' has a non scalar value of type {}",
                        name,
                        value.kind_name()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(DataSourceError::InvalidFilterInput(format!(
                "filter '{}' field '{}' must be a list, got {}",
                name,
                FILTER_VALUES_FIELD,
                other.kind_name()
            )));
        }
    };

    Ok(RawFilter::new(name, values))
}

/// Checks every raw filter against the top-level properties of `schema` and
/// reduces it to its single value.
pub fn validate_filters(raw_filters: &[RawFilter], schema: &SchemaDefinition) -> Result<Vec<Filter>, DataSourceError> {
    raw_filters
        .iter()
        .map(|raw| {
            let property = schema
                .property_by_field_name(&raw.name)
                .ok_or_else(|| DataSourceError::UnknownFilterProperty(raw.name.clone()))?;
            if !property.is_primitive() {
                return Err(DataSourceError::UnsupportedFilterType(raw.name.clone()));
            }
            match raw.values.as_slice() {
                [value] => Ok(Filter {
                    name: raw.name.clone(),
                    value: value.clone(),
                }),
                [] => Err(DataSourceError::MissingFilterValue(raw.name.clone())),
                _ => Err(DataSourceError::MultiValueFilter),
            }
        })
        .collect()
}

/// Whether `item` satisfies every filter.
///
/// A filter naming no schema property, or a property absent from the item,
/// never matches.
pub fn filter_match(filters: &[Filter], item: &ItemPayload, schema: &SchemaDefinition) -> bool {
    filters.iter().all(|filter| {
        let Some(property) = schema.property_by_field_name(&filter.name) else {
            return false;
        };
        let Ok(kind) = property.property_type() else {
            return false;
        };
        item.get(&property.name)
            .and_then(|value| value.filter_text(kind))
            .is_some_and(|text| text == filter.value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use specsource_types::Property;

    fn filter(name: &str, value: &str) -> Filter {
        Filter {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn item(entries: Vec<(&str, ItemValue)>) -> ItemPayload {
        entries.into_iter().map(|(name, value)| (name.to_string(), value)).collect()
    }

    fn primitive_schema() -> SchemaDefinition {
        SchemaDefinition::new(vec![
            Property::boolean("bool_primitive"),
            Property::number("number_primitive"),
            Property::integer("integer_primitive"),
            Property::string("label"),
            Property::list("not_primitive", "string"),
            Property::object("origin", SchemaDefinition::new(vec![Property::string("host")])),
            Property::list("rules", "object").with_nested(SchemaDefinition::new(vec![Property::string("action")])),
        ])
    }

    #[test]
    fn validate_accepts_single_values_for_every_scalar_type() {
        let raw = vec![
            RawFilter::new("integer_primitive", vec!["12345".into()]),
            RawFilter::new("label", vec!["label_to_fetch".into()]),
            RawFilter::new("number_primitive", vec!["12.56".into()]),
            RawFilter::new("bool_primitive", vec!["true".into()]),
        ];

        let filters = validate_filters(&raw, &primitive_schema()).unwrap();
        assert_eq!(filters.len(), 4);
        assert_eq!(filters[2], filter("number_primitive", "12.56"));
    }

    #[test]
    fn validate_rejects_unknown_properties() {
        let raw = vec![RawFilter::new("non_matching_property_name", vec!["x".into()])];
        let error = validate_filters(&raw, &primitive_schema()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "filter name does not match any of the schema properties: property with name 'non_matching_property_name' not existing in resource schema definition"
        );
    }

    #[test]
    fn validate_rejects_non_scalar_properties() {
        let raw = vec![
            RawFilter::new("label", vec!["my_label".into()]),
            RawFilter::new("not_primitive", vec!["x".into()]),
        ];
        let error = validate_filters(&raw, &primitive_schema()).unwrap_err();
        assert_eq!(error, DataSourceError::UnsupportedFilterType("not_primitive".into()));
        assert_eq!(error.to_string(), "property not supported as as filter: not_primitive");

        for name in ["origin", "rules"] {
            let raw = vec![RawFilter::new(name, vec!["x".into()])];
            assert_eq!(
                validate_filters(&raw, &primitive_schema()).unwrap_err(),
                DataSourceError::UnsupportedFilterType(name.into())
            );
        }
    }

    #[test]
    fn validate_rejects_multiple_and_missing_values() {
        let multi = vec![RawFilter::new("label", vec!["value1".into(), "value2".into()])];
        assert_eq!(
            validate_filters(&multi, &primitive_schema()).unwrap_err().to_string(),
            "filters for primitive properties can not have more than one value in the values field"
        );

        let empty = vec![RawFilter::new("label", Vec::new())];
        assert_eq!(
            validate_filters(&empty, &primitive_schema()).unwrap_err(),
            DataSourceError::MissingFilterValue("label".into())
        );
    }

    #[test]
    fn validate_resolves_properties_by_field_name() {
        let schema = SchemaDefinition::new(vec![Property::string("originHost")]);
        let filters = validate_filters(&[RawFilter::new("origin_host", vec!["a".into()])], &schema).unwrap();
        assert_eq!(filters, vec![filter("origin_host", "a")]);
    }

    #[test]
    fn extract_reads_blocks_and_stringifies_scalar_values() {
        let mut block = IndexMap::new();
        block.insert("name".to_string(), ItemValue::from("integer_primitive"));
        block.insert("values".to_string(), ItemValue::List(vec![ItemValue::Integer(5)]));
        let mut attributes = IndexMap::new();
        attributes.insert(
            FILTER_PROPERTY_NAME.to_string(),
            ItemValue::List(vec![ItemValue::Map(block), RawFilter::new("label", vec!["x".into()]).to_item_value()]),
        );

        let raw = extract_raw_filters(&attributes).unwrap();
        assert_eq!(
            raw,
            vec![
                RawFilter::new("integer_primitive", vec!["5".into()]),
                RawFilter::new("label", vec!["x".into()])
            ]
        );
        assert!(extract_raw_filters(&IndexMap::new()).unwrap().is_empty());
    }

    #[test]
    fn extract_rejects_malformed_blocks() {
        let mut attributes = IndexMap::new();
        attributes.insert(FILTER_PROPERTY_NAME.to_string(), ItemValue::from("label=x"));
        assert!(matches!(
            extract_raw_filters(&attributes),
            Err(DataSourceError::InvalidFilterInput(_))
        ));

        let mut nameless = IndexMap::new();
        nameless.insert("values".to_string(), ItemValue::List(vec![]));
        attributes.insert(FILTER_PROPERTY_NAME.to_string(), ItemValue::List(vec![ItemValue::Map(nameless)]));
        let error = extract_raw_filters(&attributes).unwrap_err();
        assert_eq!(error.to_string(), "invalid filter input: filter entry #0 is missing 'name'");
    }

    #[test]
    fn matches_each_scalar_type() {
        let schema = SchemaDefinition::new(vec![
            Property::string("label"),
            Property::integer("int property name"),
            Property::number("float property name"),
            Property::boolean("bool property name"),
        ]);

        assert!(filter_match(&[filter("label", "some label")], &item(vec![("label", "some label".into())]), &schema));
        assert!(filter_match(
            &[filter("int property name", "5")],
            &item(vec![("int property name", ItemValue::Integer(5))]),
            &schema
        ));
        assert!(filter_match(
            &[filter("bool property name", "false")],
            &item(vec![("bool property name", ItemValue::Bool(false))]),
            &schema
        ));
    }

    #[test]
    fn float_matching_keeps_the_decimal_point() {
        let schema = SchemaDefinition::new(vec![Property::number("float property name")]);
        let whole = item(vec![("float property name", ItemValue::Float(6.0))]);
        let fractional = item(vec![("float property name", ItemValue::Float(6.89))]);

        assert!(filter_match(&[filter("float property name", "6.0")], &whole, &schema));
        assert!(filter_match(&[filter("float property name", "6.89")], &fractional, &schema));
        assert!(!filter_match(&[filter("float property name", "6")], &whole, &schema));
    }

    #[test]
    fn unknown_names_and_values_do_not_match() {
        let schema = SchemaDefinition::new(vec![Property::string("label")]);
        let payload = item(vec![("label", "some label".into())]);

        assert!(!filter_match(&[filter("invalid filter name", "some label")], &payload, &schema));
        assert!(!filter_match(&[filter("label", "invalid filter value")], &payload, &schema));
        assert!(!filter_match(&[filter("label", "some label")], &ItemPayload::new(), &schema));
    }

    #[test]
    fn filters_built_from_an_item_match_that_item() {
        let schema = SchemaDefinition::new(vec![
            Property::string("label"),
            Property::integer("port"),
            Property::number("weight"),
            Property::boolean("enabled"),
            Property::list("tags", "string"),
        ]);
        let payload = item(vec![
            ("label", "edge".into()),
            ("port", ItemValue::Integer(443)),
            ("weight", ItemValue::Float(1.0)),
            ("enabled", ItemValue::Bool(true)),
            ("tags", ItemValue::List(vec!["a".into()])),
        ]);

        let filters: Vec<Filter> = schema
            .iter()
            .filter(|property| property.is_primitive())
            .filter_map(|property| {
                let kind = property.property_type().ok()?;
                let value = payload.get(&property.name)?.filter_text(kind)?;
                Some(filter(&property.field_name(), &value))
            })
            .collect();

        assert_eq!(filters.len(), 4);
        assert!(filter_match(&filters, &payload, &schema));
    }
}
