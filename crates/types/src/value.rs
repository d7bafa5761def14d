//! Tagged dynamic values for remote payloads.
//!
//! Listing endpoints return loosely-typed JSON. Rather than inspecting
//! `serde_json::Value` ad hoc at every call site, payloads are converted once
//! into [`ItemValue`], which keeps integers and floats apart and offers
//! explicit conversions toward each declared [`PropertyType`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::schema::PropertyType;

/// One element returned by a listing call, keyed by payload property name.
pub type ItemPayload = IndexMap<String, ItemValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ItemValue {
    #[default]
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<ItemValue>),
    Map(IndexMap<String, ItemValue>),
}

impl ItemValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ItemValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, ItemValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "number",
            Self::Bool(_) => "boolean",
            Self::List(_) => "array",
            Self::Map(_) => "object",
        }
    }

    /// Canonical text of a scalar; `None` for null, lists and maps.
    pub fn canonical_text(&self) -> Option<String> {
        match self {
            Self::String(text) => Some(text.clone()),
            Self::Integer(number) => Some(number.to_string()),
            Self::Float(number) => Some(format_float(*number)),
            Self::Bool(flag) => Some(flag.to_string()),
            Self::Null | Self::List(_) | Self::Map(_) => None,
        }
    }

    /// Text used when comparing this value with a filter value, given the
    /// declared type of the property it belongs to.
    ///
    /// `number` properties always render with a decimal point (`6.0` stays
    /// `"6.0"`), so a filter written as `"6"` never matches a float field.
    pub fn filter_text(&self, kind: PropertyType) -> Option<String> {
        match (kind, self) {
            (PropertyType::Integer, Self::Integer(number)) => Some(number.to_string()),
            (PropertyType::Integer, Self::Float(number)) => Some(whole_float_as_integer(*number).unwrap_or_else(|| format_float(*number))),
            (PropertyType::Number, Self::Float(number)) => Some(format_float(*number)),
            (PropertyType::Number, Self::Integer(number)) => Some(format_float(*number as f64)),
            (PropertyType::Boolean, Self::Bool(flag)) => Some(flag.to_string()),
            (PropertyType::Array | PropertyType::Object, _) => None,
            (_, other) => other.canonical_text(),
        }
    }

    /// Normalizes a scalar toward its declared type where the representation
    /// allows it losslessly (integer/float interchange). Everything else is
    /// returned unchanged.
    pub fn into_declared(self, kind: PropertyType) -> ItemValue {
        match (kind, self) {
            (PropertyType::Number, Self::Integer(number)) => Self::Float(number as f64),
            (PropertyType::Integer, Self::Float(number)) => match whole_float_as_integer(number) {
                Some(_) => Self::Integer(number as i64),
                None => Self::Float(number),
            },
            (_, other) => other,
        }
    }
}

/// Formats a float keeping a decimal point for whole values.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn whole_float_as_integer(value: f64) -> Option<String> {
    if value.is_finite() && value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some((value as i64).to_string())
    } else {
        None
    }
}

/// Converts a JSON object into an [`ItemPayload`]; any other shape yields `None`.
pub fn payload_from_json(value: Value) -> Option<ItemPayload> {
    match ItemValue::from(value) {
        ItemValue::Map(map) => Some(map),
        _ => None,
    }
}

impl From<Value> for ItemValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => number_to_item(&number),
            Value::String(text) => Self::String(text),
            Value::Array(items) => Self::List(items.into_iter().map(ItemValue::from).collect()),
            Value::Object(map) => Self::Map(map.into_iter().map(|(key, value)| (key, ItemValue::from(value))).collect()),
        }
    }
}

fn number_to_item(number: &Number) -> ItemValue {
    if let Some(integer) = number.as_i64() {
        return ItemValue::Integer(integer);
    }
    ItemValue::Float(number.as_f64().unwrap_or(f64::NAN))
}

impl From<ItemValue> for Value {
    fn from(value: ItemValue) -> Self {
        match value {
            ItemValue::Null => Value::Null,
            ItemValue::String(text) => Value::String(text),
            ItemValue::Integer(number) => Value::Number(number.into()),
            ItemValue::Float(number) => Number::from_f64(number).map_or(Value::Null, Value::Number),
            ItemValue::Bool(flag) => Value::Bool(flag),
            ItemValue::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            ItemValue::Map(map) => Value::Object(map.into_iter().map(|(key, value)| (key, Value::from(value))).collect::<Map<_, _>>()),
        }
    }
}

impl From<&str> for ItemValue {
    fn from(text: &str) -> Self {
        Self::String(text.to_string())
    }
}

impl From<String> for ItemValue {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl From<i64> for ItemValue {
    fn from(number: i64) -> Self {
        Self::Integer(number)
    }
}

impl From<f64> for ItemValue {
    fn from(number: f64) -> Self {
        Self::Float(number)
    }
}

impl From<bool> for ItemValue {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<Vec<ItemValue>> for ItemValue {
    fn from(items: Vec<ItemValue>) -> Self {
        Self::List(items)
    }
}

impl From<IndexMap<String, ItemValue>> for ItemValue {
    fn from(map: IndexMap<String, ItemValue>) -> Self {
        Self::Map(map)
    }
}
