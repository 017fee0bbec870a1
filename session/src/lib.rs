//! Strand Session
//!
//! The session façade: load, save, delete and query mapped objects.
//!
//! Responsibilities:
//! - Route every operation to the open transaction or to autocommit
//! - Select and cache the statement strategy of each mapped type
//! - Compile saves and bind returned identities
//! - Rebuild objects from graph results through the mapping context
//! - Guard ad-hoc statements (read-only queries, nothing returned on execute)

mod config;
mod error;
mod row;
mod scope;
mod session;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use row::{MapRowMapper, QueryItem, RowMap, RowMapper, ScalarRowMapper};
pub use scope::TransactionScope;
pub use session::Session;
