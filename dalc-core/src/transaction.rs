use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use crate::driver::Connection;
use crate::error::{Error, Result};

/// A driver connection shared between a transaction and the accessors
/// participating in it.
pub(crate) type SharedConnection = Rc<RefCell<Box<dyn Connection>>>;

/// A shared handle to an in-progress database transaction.
///
/// The handle wraps the driver connection the transaction runs on and tracks
/// whether the transaction has been committed or rolled back, so the owning
/// accessor knows whether it still needs to be finalized at teardown.
///
/// Cloning is cheap and produces another reference to the same transaction;
/// this is how several accessors participate in one unit of work. Exactly one
/// accessor — the one that called [`Dalc::begin_transaction`] — owns the
/// transaction and is responsible for finalizing and disposing it. All other
/// holders are read-only participants with respect to its lifecycle.
///
/// [`Dalc::begin_transaction`]: crate::dalc::Dalc::begin_transaction
#[derive(Clone)]
pub struct Transaction {
    inner: Rc<RefCell<TransactionInner>>,
}

struct TransactionInner {
    conn: SharedConnection,
    committed: bool,
    rolled_back: bool,
    disposed: bool,
}

impl TransactionInner {
    fn check_live(&self) -> Result<()> {
        if self.committed {
            return Err(Error::InvalidOperation(
                "transaction has already been committed",
            ));
        }
        if self.rolled_back {
            return Err(Error::InvalidOperation(
                "transaction has already been rolled back",
            ));
        }
        if self.disposed {
            return Err(Error::InvalidOperation("transaction has been disposed"));
        }
        Ok(())
    }
}

impl Transaction {
    /// Starts a driver transaction on `conn` and wraps it in a new handle.
    pub(crate) fn begin(mut conn: Box<dyn Connection>) -> Result<Self> {
        if let Err(source) = conn.begin() {
            if let Err(error) = conn.close() {
                tracing::error!(%error, "error closing connection after failed begin");
            }
            return Err(Error::Database(source));
        }

        Ok(Transaction {
            inner: Rc::new(RefCell::new(TransactionInner {
                conn: Rc::new(RefCell::new(conn)),
                committed: false,
                rolled_back: false,
                disposed: false,
            })),
        })
    }

    /// Commits the transaction.
    ///
    /// Fails with [`Error::InvalidOperation`] if the transaction was already
    /// committed, rolled back or disposed.
    pub fn commit(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.check_live()?;
        inner
            .conn
            .borrow_mut()
            .commit()
            .map_err(Error::Database)?;
        inner.committed = true;
        Ok(())
    }

    /// Rolls the transaction back.
    ///
    /// Fails with [`Error::InvalidOperation`] if the transaction was already
    /// committed, rolled back or disposed.
    pub fn rollback(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.check_live()?;
        inner
            .conn
            .borrow_mut()
            .rollback()
            .map_err(Error::Database)?;
        inner.rolled_back = true;
        Ok(())
    }

    /// Whether the transaction still has to be committed or rolled back.
    pub fn needs_finalization(&self) -> bool {
        let inner = self.inner.borrow();
        !(inner.committed || inner.rolled_back)
    }

    pub fn is_committed(&self) -> bool {
        self.inner.borrow().committed
    }

    pub fn is_rolled_back(&self) -> bool {
        self.inner.borrow().rolled_back
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }

    /// The connection this transaction runs on. Commands issued by
    /// participating accessors must go through it.
    pub(crate) fn connection(&self) -> SharedConnection {
        Rc::clone(&self.inner.borrow().conn)
    }

    /// Releases the underlying connection. Idempotent; called only by the
    /// owning accessor.
    pub(crate) fn dispose(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.disposed {
            return Ok(());
        }
        inner.disposed = true;
        let result = inner.conn.borrow_mut().close().map_err(Error::Database);
        result
    }
}

impl Debug for Transaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Transaction")
            .field("committed", &inner.committed)
            .field("rolled_back", &inner.rolled_back)
            .field("disposed", &inner.disposed)
            .finish()
    }
}
