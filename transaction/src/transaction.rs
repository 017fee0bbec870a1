//! A server-side transaction as seen by one session.

use std::fmt;
use strand_mapping::BatchRecord;

/// Transaction lifecycle state.
///
/// Only `Open` is usable. Committed, rolled back and closed transactions
/// make the session fall back to autocommit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Open,
    Committed,
    RolledBack,
    Closed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionStatus::Open => "open",
            TransactionStatus::Committed => "committed",
            TransactionStatus::RolledBack => "rolled back",
            TransactionStatus::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// An explicit transaction.
#[derive(Debug)]
pub struct Transaction {
    url: String,
    status: TransactionStatus,
    records: Vec<BatchRecord>,
}

impl Transaction {
    /// Create an open transaction at a server-issued URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: TransactionStatus::Open,
            records: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL that commits this transaction.
    pub fn commit_url(&self) -> String {
        format!("{}/commit", self.url.trim_end_matches('/'))
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == TransactionStatus::Open
    }

    /// Keep the local effects of a save made inside this transaction.
    pub fn append(&mut self, record: BatchRecord) {
        if !record.is_empty() {
            self.records.push(record);
        }
    }

    pub fn records(&self) -> &[BatchRecord] {
        &self.records
    }

    pub(crate) fn finish(&mut self, status: TransactionStatus) -> Vec<BatchRecord> {
        self.status = status;
        std::mem::take(&mut self.records)
    }
}
