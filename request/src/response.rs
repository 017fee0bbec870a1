//! Forward-only result cursors.

use std::collections::VecDeque;
use strand_core::QueryStatistics;
use tracing::trace;

/// A forward-only cursor over the results of one request.
///
/// The cursor is closed when exhausted by its owner, when `close` is called,
/// or when it is dropped. Closing twice is a no-op, and a closed cursor
/// yields nothing.
#[derive(Debug)]
pub struct Response<T> {
    kind: &'static str,
    columns: Vec<String>,
    items: VecDeque<T>,
    statistics: Option<QueryStatistics>,
    closed: bool,
}

impl<T> Response<T> {
    pub(crate) fn new(
        kind: &'static str,
        columns: Vec<String>,
        items: Vec<T>,
        statistics: Option<QueryStatistics>,
    ) -> Self {
        Self {
            kind,
            columns,
            items: items.into(),
            statistics,
            closed: false,
        }
    }

    /// Column names of the result.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Update counters, when the statement asked for them.
    pub fn statistics(&self) -> Option<&QueryStatistics> {
        self.statistics.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release the cursor. Remaining items are discarded.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let discarded = self.items.len();
        self.items.clear();
        trace!(kind = self.kind, discarded, "response closed");
    }
}

impl<T> Iterator for Response<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.closed {
            return None;
        }
        self.items.pop_front()
    }
}

impl<T> Drop for Response<T> {
    fn drop(&mut self) {
        self.close();
    }
}
