//! Session error types.

use strand_core::messages;
use strand_cypher::CypherError;
use strand_mapping::MappingError;
use strand_metadata::MetaDataError;
use strand_request::RequestError;
use strand_transaction::TransactionError;
use thiserror::Error;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Metadata error.
    #[error("metadata error: {0}")]
    MetaData(#[from] MetaDataError),

    /// Statement construction error.
    #[error("statement error: {0}")]
    Cypher(#[from] CypherError),

    /// Mapping error.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Request error.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Statement text is empty.
    #[error("{}", messages::ERR_EMPTY_STATEMENT)]
    EmptyStatement,

    /// A write clause inside a read-only query.
    #[error("{} (found {keyword})", messages::ERR_READ_ONLY)]
    ReadOnlyViolation { keyword: String },

    /// A RETURN clause inside a statement run for its statistics.
    #[error("{}", messages::ERR_NOTHING_RETURNED)]
    ReturnNotAllowed,

    /// A query expected to produce a single result produced more.
    #[error("incorrect result size: expected {expected}, actual {actual}")]
    IncorrectResultSize { expected: usize, actual: usize },

    /// Named queries are not supported.
    #[error("{}: {name}", messages::ERR_NAMED_QUERIES)]
    UnsupportedNamedQuery { name: String },

    /// A typed query without a usable type.
    #[error("{}", messages::ERR_TYPE_REQUIRED)]
    InvalidType,

    /// A row did not have the shape a row mapper needs.
    #[error("{message}")]
    RowShape { message: String },
}

impl SessionError {
    pub fn incorrect_result_size(expected: usize, actual: usize) -> Self {
        Self::IncorrectResultSize { expected, actual }
    }

    pub fn unsupported_named_query(name: impl Into<String>) -> Self {
        Self::UnsupportedNamedQuery { name: name.into() }
    }

    pub fn row_shape(message: impl Into<String>) -> Self {
        Self::RowShape {
            message: message.into(),
        }
    }

    /// Lift the statement guards' usage errors to session usage errors.
    pub(crate) fn usage(err: CypherError) -> Self {
        match err {
            CypherError::EmptyStatement => Self::EmptyStatement,
            CypherError::ReadOnlyViolation { keyword } => Self::ReadOnlyViolation { keyword },
            CypherError::ReturnNotAllowed => Self::ReturnNotAllowed,
            other => Self::Cypher(other),
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
