//! Transaction manager: one explicit transaction at a time, autocommit otherwise.

use crate::{Transaction, TransactionError, TransactionResult, TransactionStatus};
use strand_mapping::{BatchRecord, MappingContext};
use strand_metadata::MetaData;
use strand_request::{RequestHandler, Transport};
use tracing::debug;

/// Path of the transactional endpoint below the server base URL.
pub const TRANSACTION_PATH: &str = "db/data/transaction";

fn endpoint(base_url: &str) -> String {
    if base_url.ends_with('/') {
        format!("{}{}", base_url, TRANSACTION_PATH)
    } else {
        format!("{}/{}", base_url, TRANSACTION_PATH)
    }
}

/// URL that runs a batch in its own implicit transaction.
pub fn autocommit_url(base_url: &str) -> String {
    format!("{}/commit", endpoint(base_url))
}

/// Owns the explicit transaction of one session.
#[derive(Debug)]
pub struct TransactionManager {
    base_url: String,
    current: Option<Transaction>,
}

impl TransactionManager {
    /// Create a new manager for a server base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            current: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The most recent explicit transaction, in whatever state it is.
    pub fn current(&self) -> Option<&Transaction> {
        self.current.as_ref()
    }

    /// Check if an explicit transaction is open.
    pub fn is_open(&self) -> bool {
        self.current.as_ref().map_or(false, Transaction::is_open)
    }

    /// URL an operation should post to: the open transaction, or autocommit.
    pub fn target_url(&self) -> String {
        match &self.current {
            Some(tx) if tx.is_open() => tx.url().to_string(),
            _ => autocommit_url(&self.base_url),
        }
    }

    /// Keep the local effects of a save when it ran inside an open transaction.
    pub fn record(&mut self, record: BatchRecord) {
        if let Some(tx) = self.current.as_mut().filter(|tx| tx.is_open()) {
            tx.append(record);
        }
    }

    // ==================== Lifecycle ====================

    /// Open an explicit transaction.
    pub fn open<T: Transport>(&mut self, transport: &mut T) -> TransactionResult<&Transaction> {
        if let Some(tx) = self.current.as_ref().filter(|tx| tx.is_open()) {
            return Err(TransactionError::already_open(tx.url()));
        }

        let response = RequestHandler::new(transport).send(&endpoint(&self.base_url), &[])?;
        let url = response
            .location
            .or_else(|| {
                response
                    .body
                    .commit
                    .map(|commit| commit.trim_end_matches("/commit").to_string())
            })
            .ok_or(TransactionError::MissingUrl)?;

        debug!(url = %url, "transaction opened");
        Ok(&*self.current.insert(Transaction::new(url)))
    }

    /// Commit the open transaction.
    ///
    /// When the server refuses the commit, the transaction is gone on the
    /// server side, so its local effects are reverted before the error is
    /// returned.
    pub fn commit<T: Transport>(
        &mut self,
        transport: &mut T,
        context: &mut MappingContext,
        metadata: &MetaData,
    ) -> TransactionResult<()> {
        let tx = self.open_transaction()?;
        let url = tx.commit_url();
        match RequestHandler::new(transport).send(&url, &[]) {
            Ok(_) => {
                tx.finish(TransactionStatus::Committed);
                debug!(url = %url, "transaction committed");
                Ok(())
            }
            Err(err) => {
                revert(tx.finish(TransactionStatus::RolledBack), context, metadata);
                debug!(url = %url, error = %err, "commit failed, local changes reverted");
                Err(err.into())
            }
        }
    }

    /// Roll back the open transaction and undo its local effects.
    ///
    /// Local effects are undone even when the server cannot be reached; an
    /// abandoned transaction expires on the server without committing.
    pub fn rollback<T: Transport>(
        &mut self,
        transport: &mut T,
        context: &mut MappingContext,
        metadata: &MetaData,
    ) -> TransactionResult<()> {
        let tx = self.open_transaction()?;
        let url = tx.url().to_string();
        let outcome = RequestHandler::new(transport).delete(&url);
        let status = if outcome.is_ok() {
            TransactionStatus::RolledBack
        } else {
            TransactionStatus::Closed
        };
        revert(tx.finish(status), context, metadata);
        debug!(url = %url, status = %status, "transaction rolled back");
        outcome.map_err(TransactionError::from)
    }

    /// Close the current transaction. An open one is rolled back first.
    pub fn close<T: Transport>(
        &mut self,
        transport: &mut T,
        context: &mut MappingContext,
        metadata: &MetaData,
    ) -> TransactionResult<()> {
        let result = if self.is_open() {
            self.rollback(transport, context, metadata)
        } else {
            Ok(())
        };
        if let Some(tx) = self.current.as_mut() {
            tx.finish(TransactionStatus::Closed);
            debug!(url = %tx.url(), "transaction closed");
        }
        result
    }

    fn open_transaction(&mut self) -> TransactionResult<&mut Transaction> {
        match self.current.as_mut() {
            Some(tx) if tx.is_open() => Ok(tx),
            Some(tx) => Err(TransactionError::not_open(tx.status())),
            None => Err(TransactionError::not_open("none")),
        }
    }
}

/// Undo records newest first.
fn revert(records: Vec<BatchRecord>, context: &mut MappingContext, metadata: &MetaData) {
    for record in records.iter().rev() {
        record.revert(context, metadata);
    }
}
