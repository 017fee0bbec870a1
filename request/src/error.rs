//! Request error types.

use crate::TransportError;
use thiserror::Error;

/// Request errors.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The transport could not deliver the request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The body could not be encoded or decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server reported an error for the batch.
    #[error("server error {code}: {message}")]
    Server { code: String, message: String },

    /// The response does not carry the requested result contents.
    #[error("unexpected response shape: {message}")]
    Shape { message: String },
}

impl RequestError {
    pub fn server(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Server {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
        }
    }
}

/// Result type for request operations.
pub type RequestResult<T> = Result<T, RequestError>;
