//! # Specsource Engine
//!
//! The engine turns a resource described by an abstract schema into a
//! read-only, filterable data source. Given a [`SpecResource`], it:
//!
//! - derives the queryable schema (attributes, parent identifiers and the
//!   `filter` block) with [`SchemaConverter`]
//! - validates caller filters against the resource schema
//! - lists the remote collection through a [`RemoteLister`], matches items
//!   against the filters and requires exactly one survivor
//! - projects the matched item into the caller's [`ResourceData`] and reports
//!   the read to a [`TelemetryHandler`]
//!
//! ## Architecture
//!
//! - **`data_source`**: read orchestration ([`DataSourceFactory`])
//! - **`filter`**: filter extraction, validation and matching
//! - **`schema`**: queryable schema conversion
//! - **`project`**: result projection
//! - **`lister`**: the remote listing seam and its HTTP implementation
//! - **`telemetry`**: usage notifications
//!
//! [`SpecResource`]: specsource_types::SpecResource

pub mod data_source;
pub mod error;
pub mod filter;
pub mod lister;
pub mod project;
pub mod schema;
pub mod telemetry;

pub use data_source::{DataSourceFactory, ResourceData};
pub use error::DataSourceError;
pub use filter::{FILTER_PROPERTY_NAME, Filter, RawFilter, extract_raw_filters, filter_match, validate_filters};
pub use lister::{HttpRemoteLister, ListRequest, ListResponse, RemoteLister};
pub use project::ResultProjector;
pub use schema::{FieldElement, FieldSchema, FieldType, QueryableSchema, SchemaConverter};
pub use telemetry::{HttpTelemetry, NoopTelemetry, TelemetryHandler, TelemetryOperation, TracingTelemetry};
