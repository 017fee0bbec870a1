//! Transaction error types.

use strand_request::RequestError;
use thiserror::Error;

/// Transaction errors.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// No open transaction to commit or roll back.
    #[error("transaction is not open ({status})")]
    NotOpen { status: String },

    /// Another explicit transaction is still open.
    #[error("a transaction is already open at {url}")]
    AlreadyOpen { url: String },

    /// The server opened a transaction without telling us where.
    #[error("server response carries no transaction url")]
    MissingUrl,

    /// The exchange with the server failed.
    #[error("transaction request failed: {0}")]
    Request(#[from] RequestError),
}

impl TransactionError {
    pub fn not_open(status: impl ToString) -> Self {
        Self::NotOpen {
            status: status.to_string(),
        }
    }

    pub fn already_open(url: impl Into<String>) -> Self {
        Self::AlreadyOpen { url: url.into() }
    }
}

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;
