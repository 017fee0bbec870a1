//! Cypher error types.

use strand_core::messages;
use thiserror::Error;

/// Errors raised while building or checking statements.
#[derive(Debug, Error, PartialEq)]
pub enum CypherError {
    /// Statement text is empty.
    #[error("{}", messages::ERR_EMPTY_STATEMENT)]
    EmptyStatement,

    /// A write clause inside a read-only statement.
    #[error("{}", messages::ERR_READ_ONLY)]
    ReadOnlyViolation { keyword: String },

    /// A RETURN clause inside a fire-and-forget statement.
    #[error("{}", messages::ERR_NOTHING_RETURNED)]
    ReturnNotAllowed,

    /// A filter names a type that is not mapped.
    #[error("unknown entity type: {name}")]
    UnknownType { name: String },

    /// A nested filter names a relationship field the owner does not declare.
    #[error("{owner} has no relationship field {field}")]
    UnknownRelationshipField { owner: String, field: String },

    /// Nested filters only apply to node entities.
    #[error("nested filters are not supported on relationship entity {name}")]
    UnsupportedNestedFilter { name: String },

    /// A guard pattern failed to compile.
    #[error("invalid guard pattern: {message}")]
    Pattern { message: String },
}

impl CypherError {
    pub fn read_only_violation(keyword: impl Into<String>) -> Self {
        Self::ReadOnlyViolation {
            keyword: keyword.into(),
        }
    }

    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    pub fn unknown_relationship_field(owner: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownRelationshipField {
            owner: owner.into(),
            field: field.into(),
        }
    }

    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern {
            message: message.into(),
        }
    }
}

/// Result type for statement building.
pub type CypherResult<T> = Result<T, CypherError>;
