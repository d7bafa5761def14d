//! Error types for data-source reads.

use thiserror::Error;

/// Terminal failure of a data-source schema conversion or read.
///
/// Collaborator failures (schema source, parent resolution, transport) carry
/// the collaborator's message verbatim so callers see the original text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataSourceError {
    #[error("missing openAPI resource configuration")]
    MissingResourceConfiguration,

    #[error("{0}")]
    SchemaSource(String),

    #[error("{0}")]
    ParentResolution(String),

    #[error("non supported type {0}")]
    UnsupportedType(String),

    #[error("non supported list item type '{items}' for property '{name}'")]
    UnsupportedListItemType { name: String, items: String },

    #[error(
        "filter name does not match any of the schema properties: property with name '{0}' not existing in resource schema definition"
    )]
    UnknownFilterProperty(String),

    #[error("property not supported as as filter: {0}")]
    UnsupportedFilterType(String),

    #[error("filters for primitive properties can not have more than one value in the values field")]
    MultiValueFilter,

    #[error("filter for property '{0}' does not contain any value in the values field")]
    MissingFilterValue(String),

    #[error("invalid filter input: {0}")]
    InvalidFilterInput(String),

    #[error("{0}")]
    Transport(String),

    #[error("your query returned no results. Please change your search criteria and try again")]
    NoResults,

    #[error("your query returned contains more than one result. Please change your search criteria to make it more specific")]
    AmbiguousResult,

    #[error("response object returned from the API is missing mandatory identifier property '{0}'")]
    MissingIdentifier(String),
}

impl DataSourceError {
    /// Builds the error reported when a listing answers with a status other than 200.
    pub fn unexpected_status(resource_name: &str, path: &str, status_code: u16, body: &str) -> Self {
        Self::Transport(format!(
            "[data source='{resource_name}'] GET {path} failed: [resource='{resource_name}'] HTTP Response Status Code {status_code} not matching expected one [200] ({body})"
        ))
    }

    /// Wraps a collaborator error, keeping its full context chain.
    pub(crate) fn verbatim(error: &anyhow::Error) -> String {
        format!("{error:#}")
    }
}
