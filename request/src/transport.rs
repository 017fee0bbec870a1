//! The channel statements travel over.

use thiserror::Error;

/// What came back from one exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportResponse {
    /// The `Location` header, set when the server opened a transaction.
    pub location: Option<String>,
    pub body: String,
}

impl TransportResponse {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            location: None,
            body: body.into(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// The transport could not complete an exchange.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// An opaque request channel: JSON text out, JSON text back.
pub trait Transport {
    /// Post a JSON body to a URL.
    fn post(&mut self, url: &str, body: &str) -> TransportResult<TransportResponse>;

    /// Issue a DELETE against a URL.
    fn delete(&mut self, url: &str) -> TransportResult<TransportResponse>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn post(&mut self, url: &str, body: &str) -> TransportResult<TransportResponse> {
        (**self).post(url, body)
    }

    fn delete(&mut self, url: &str) -> TransportResult<TransportResponse> {
        (**self).delete(url)
    }
}
