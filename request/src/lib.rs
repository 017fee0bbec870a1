//! Strand Request
//!
//! Request/response handling for the transactional endpoint.
//!
//! Responsibilities:
//! - Serialize statement batches into the wire body
//! - Post them through a pluggable `Transport`
//! - Turn server `errors` into typed errors
//! - Hand results out through forward-only cursors that close on drop

mod error;
mod handler;
mod response;
mod transport;
mod wire;

pub use error::{RequestError, RequestResult};
pub use handler::{RequestHandler, ServerResponse};
pub use response::Response;
pub use transport::{Transport, TransportError, TransportResponse, TransportResult};
pub use wire::{ResponseBody, ResultData, ServerError, StatementResult, StatementsBody};
