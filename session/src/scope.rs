//! Scoped explicit transactions.

use crate::{Session, SessionResult};
use std::ops::{Deref, DerefMut};
use strand_request::Transport;
use tracing::warn;

/// An explicit transaction bound to a session borrow.
///
/// Operations run through the scope (it derefs to the session) join the
/// transaction. Dropping a scope whose transaction is still open rolls it
/// back.
pub struct TransactionScope<'s, 'm, T: Transport> {
    session: &'s mut Session<'m, T>,
}

impl<'s, 'm, T: Transport> TransactionScope<'s, 'm, T> {
    pub(crate) fn new(session: &'s mut Session<'m, T>) -> Self {
        Self { session }
    }

    /// Commit the transaction.
    pub fn commit(self) -> SessionResult<()> {
        self.session.commit_transaction()
    }

    /// Roll the transaction back.
    pub fn rollback(self) -> SessionResult<()> {
        self.session.rollback_transaction()
    }

    /// Close the scope, rolling back if nothing was committed.
    pub fn close(self) -> SessionResult<()> {
        self.session.close_transaction()
    }
}

impl<'m, T: Transport> Deref for TransactionScope<'_, 'm, T> {
    type Target = Session<'m, T>;

    fn deref(&self) -> &Self::Target {
        &*self.session
    }
}

impl<T: Transport> DerefMut for TransactionScope<'_, '_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.session
    }
}

impl<T: Transport> Drop for TransactionScope<'_, '_, T> {
    fn drop(&mut self) {
        if !self.session.in_transaction() {
            return;
        }
        if let Err(err) = self.session.rollback_transaction() {
            warn!(error = %err, "rollback of abandoned transaction failed");
        }
    }
}
