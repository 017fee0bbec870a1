//! Mapping error types.

use thiserror::Error;

/// Mapping errors.
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    /// A type has no descriptor.
    #[error("unknown entity type: {name}")]
    UnknownType { name: String },

    /// A relationship entity lacks its start or end node.
    #[error("relationship entity {name} has no {endpoint} node")]
    MissingEndpoint { name: String, endpoint: &'static str },

    /// A create statement did not return an identity for an alias.
    #[error("no identity returned for {alias}")]
    UnboundAlias { alias: String },
}

impl MappingError {
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    pub fn missing_endpoint(name: impl Into<String>, endpoint: &'static str) -> Self {
        Self::MissingEndpoint {
            name: name.into(),
            endpoint,
        }
    }

    pub fn unbound_alias(alias: impl Into<String>) -> Self {
        Self::UnboundAlias {
            alias: alias.into(),
        }
    }
}

/// Result type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;
