use std::{error::Error, fmt, str::FromStr};

use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

use crate::value::ItemValue;

/// The kinds a schema property may declare.
///
/// Schema sources describe types as strings (`"string"`, `"integer"`, ...).
/// Parsing into this enum happens at conversion time so that an unknown
/// declared type surfaces as an [`UnsupportedTypeError`] naming the offender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Scalar kinds are the only ones a filter may target.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::String | Self::Integer | Self::Number | Self::Boolean)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = UnsupportedTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "integer" | "int" => Ok(Self::Integer),
            "number" | "float" => Ok(Self::Number),
            "boolean" | "bool" => Ok(Self::Boolean),
            "array" | "list" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            other => Err(UnsupportedTypeError(other.to_string())),
        }
    }
}

/// Raised when a property declares a type outside of [`PropertyType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedTypeError(pub String);

impl fmt::Display for UnsupportedTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "non supported type {}", self.0)
    }
}

impl Error for UnsupportedTypeError {}

/// A single named, typed property of a [`SchemaDefinition`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Name of the property as it appears in remote payloads
    pub name: String,
    /// Declared type as written by the schema source (e.g. "string", "array")
    #[serde(rename = "type")]
    pub r#type: String,
    /// Declared element type for `array` properties
    #[serde(default)]
    pub items_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub read_only: bool,
    /// Marks the primary key of the resource
    #[serde(default)]
    pub is_identifier: bool,
    /// Marks a synthetic `<parent>_id` property of a sub-resource
    #[serde(default)]
    pub is_parent_property: bool,
    /// Overrides the derived snake_case field name
    #[serde(default)]
    pub preferred_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Option<ItemValue>,
    /// Nested schema for `object` properties and arrays of objects
    #[serde(default)]
    pub nested: Option<SchemaDefinition>,
}

impl Property {
    pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            r#type: r#type.into(),
            ..Self::default()
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, PropertyType::String.as_str())
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, PropertyType::Integer.as_str())
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, PropertyType::Number.as_str())
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, PropertyType::Boolean.as_str())
    }

    pub fn list(name: impl Into<String>, items_type: impl Into<String>) -> Self {
        let mut property = Self::new(name, PropertyType::Array.as_str());
        property.items_type = Some(items_type.into());
        property
    }

    pub fn object(name: impl Into<String>, nested: SchemaDefinition) -> Self {
        Self::new(name, PropertyType::Object.as_str()).with_nested(nested)
    }

    pub fn with_nested(mut self, nested: SchemaDefinition) -> Self {
        self.nested = Some(nested);
        self
    }

    pub fn with_default(mut self, default: impl Into<ItemValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_preferred_name(mut self, preferred_name: impl Into<String>) -> Self {
        self.preferred_name = Some(preferred_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn identifier(mut self) -> Self {
        self.is_identifier = true;
        self
    }

    pub fn parent_property(mut self) -> Self {
        self.is_parent_property = true;
        self
    }

    pub fn property_type(&self) -> Result<PropertyType, UnsupportedTypeError> {
        self.r#type.parse()
    }

    /// Element type of an `array` property. Arrays that only carry a nested
    /// schema are treated as arrays of objects.
    pub fn items_property_type(&self) -> Result<Option<PropertyType>, UnsupportedTypeError> {
        match self.items_type.as_deref() {
            Some(items) => items.parse().map(Some),
            None if self.nested.is_some() => Ok(Some(PropertyType::Object)),
            None => Ok(None),
        }
    }

    /// Whether the declared type is a scalar. Unknown types are not primitive.
    pub fn is_primitive(&self) -> bool {
        self.property_type().map(|kind| kind.is_primitive()).unwrap_or(false)
    }

    /// Output field name: the preferred name when set, otherwise the payload
    /// name converted to snake_case (`originPort` -> `origin_port`).
    pub fn field_name(&self) -> String {
        match self.preferred_name.as_deref() {
            Some(preferred) if !preferred.trim().is_empty() => preferred.to_string(),
            _ => self.name.to_snake_case(),
        }
    }
}

/// Ordered set of uniquely named properties describing one resource kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub properties: Vec<Property>,
}

impl SchemaDefinition {
    pub fn new(properties: Vec<Property>) -> Self {
        Self { properties }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Looks a property up by its payload name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }

    /// Looks a property up by the name users see (the output field name),
    /// falling back to the payload name.
    pub fn property_by_field_name(&self, field_name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|property| property.field_name() == field_name)
            .or_else(|| self.property(field_name))
    }

    /// The property flagged as identifier, or the one named `id`.
    pub fn identifier_property(&self) -> Option<&Property> {
        self.properties
            .iter()
            .find(|property| property.is_identifier)
            .or_else(|| self.property("id"))
    }

    pub fn is_identifier(&self, property: &Property) -> bool {
        self.identifier_property().is_some_and(|identifier| identifier.name == property.name)
    }
}
