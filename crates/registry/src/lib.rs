//! Schema source for Specsource data sources.
//!
//! This crate loads OpenAPI documents, discovers the collections they can
//! list, and exposes each one as a [`SpecResource`](specsource_types::SpecResource)
//! the engine can read from. It also owns the user configuration file.

pub mod catalog;
pub mod config;
pub mod openapi;
pub mod resource;

pub use catalog::ResourceCatalog;
pub use config::{SpecSourceConfig, default_config_path};
pub use resource::OpenApiResource;
