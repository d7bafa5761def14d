//! Shared type definitions for Specsource.
//!
//! This crate holds the vocabulary every other crate speaks:
//!
//! - **`schema`**: the abstract property schema ([`SchemaDefinition`], [`Property`])
//!   supplied by a schema source and consumed read-only by the engine
//! - **`value`**: the tagged dynamic value ([`ItemValue`]) used for loosely-typed
//!   remote payloads and data-source state
//! - **`resource`**: the [`SpecResource`] collaborator contract that ties a
//!   schema to a remote collection path

pub mod resource;
pub mod schema;
pub mod value;

pub use resource::{DATA_SOURCE_NAME_PREFIX, PARENT_PROPERTY_SUFFIX, ParentResourceInfo, SpecResource};
pub use schema::{Property, PropertyType, SchemaDefinition, UnsupportedTypeError};
pub use value::{ItemPayload, ItemValue, format_float, payload_from_json};
