//! Strand Transaction
//!
//! Transaction lifecycle over the transactional endpoint.
//!
//! Responsibilities:
//! - Open, commit and roll back explicit transactions
//! - Pick the target URL for each operation (explicit or autocommit)
//! - Keep the local effects of every save inside a transaction so a
//!   rollback can undo them in the mapping context

mod error;
mod manager;
mod transaction;

pub use error::{TransactionError, TransactionResult};
pub use manager::{autocommit_url, TransactionManager, TRANSACTION_PATH};
pub use transaction::{Transaction, TransactionStatus};
