use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use std::time::Duration;

use log::LevelFilter;

use crate::command::{command_context, normalize_params, CommandKind, Param};
use crate::driver::{Connection, DataProvider};
use crate::error::{BoxDynError, Error, Result};
use crate::logger::{LogSettings, StatementLogger};
use crate::reader::Reader;
use crate::row::{Columns, Table};
use crate::transaction::{SharedConnection, Transaction};
use crate::value::Value;

/// What to do, at teardown, with a transaction the accessor owns that was
/// never explicitly committed or rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalizePolicy {
    /// Commit the transaction.
    #[default]
    Commit,
    /// Roll the transaction back.
    Rollback,
}

/// A transaction-aware data accessor over a pluggable driver.
///
/// A `Dalc` is constructed in one of two ways:
///
/// - [`Dalc::new`] binds it to a [`DataProvider`]. Until a transaction is
///   begun, every operation opens a fresh connection for its own duration and
///   closes it before returning.
/// - [`Dalc::from_transaction`] binds it to a transaction begun by another
///   accessor, so several logical accessors share one unit of work. A
///   borrowing accessor never finalizes or disposes the transaction — that
///   stays with its creator.
///
/// After [`begin_transaction`](Dalc::begin_transaction), every operation runs
/// on the transaction's connection. If the accessor is torn down while its
/// own transaction is still unfinalized, the configured [`FinalizePolicy`]
/// is applied (commit, by default).
///
/// `Dalc` is single-threaded by design: it holds no locks and is `!Send`.
pub struct Dalc {
    inner: Box<DalcInner>,
}

struct DalcInner {
    provider: Option<Rc<dyn DataProvider>>,
    default_kind: CommandKind,
    transaction: Option<Transaction>,
    owns_transaction: bool,
    finalize_policy: FinalizePolicy,
    log_settings: LogSettings,
    closed: bool,
}

impl Debug for Dalc {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dalc")
            .field("default_kind", &self.inner.default_kind)
            .field("transaction", &self.inner.transaction)
            .field("owns_transaction", &self.inner.owns_transaction)
            .field("finalize_policy", &self.inner.finalize_policy)
            .finish()
    }
}

impl Dalc {
    /// Creates an accessor bound to a connection provider, defaulting to
    /// [`CommandKind::Text`].
    pub fn new(provider: Rc<dyn DataProvider>) -> Self {
        Self::with_default_kind(provider, CommandKind::Text)
    }

    /// Creates an accessor bound to a connection provider with an explicit
    /// default command kind.
    pub fn with_default_kind(provider: Rc<dyn DataProvider>, default_kind: CommandKind) -> Self {
        Dalc {
            inner: Box::new(DalcInner {
                provider: Some(provider),
                default_kind,
                transaction: None,
                owns_transaction: false,
                finalize_policy: FinalizePolicy::default(),
                log_settings: LogSettings::default(),
                closed: false,
            }),
        }
    }

    /// Creates an accessor that participates in an existing transaction.
    ///
    /// The new accessor runs every operation on the transaction's connection
    /// but does not own the transaction: dropping or closing this accessor
    /// leaves the transaction untouched.
    pub fn from_transaction(transaction: &Transaction) -> Result<Self> {
        if transaction.is_disposed() {
            return Err(Error::Argument("transaction has been disposed"));
        }

        Ok(Dalc {
            inner: Box::new(DalcInner {
                provider: None,
                default_kind: CommandKind::Text,
                transaction: Some(transaction.clone()),
                owns_transaction: false,
                finalize_policy: FinalizePolicy::default(),
                log_settings: LogSettings::default(),
                closed: false,
            }),
        })
    }

    /// Sets the policy applied to an owned, unfinalized transaction at
    /// teardown.
    pub fn with_finalize_policy(mut self, policy: FinalizePolicy) -> Self {
        self.inner.finalize_policy = policy;
        self
    }

    /// Log executed statements at the specified level.
    pub fn log_statements(&mut self, level: LevelFilter) -> &mut Self {
        self.inner.log_settings.log_statements(level);
        self
    }

    /// Log statements slower than `duration` at the specified level.
    pub fn log_slow_statements(&mut self, level: LevelFilter, duration: Duration) -> &mut Self {
        self.inner.log_settings.log_slow_statements(level, duration);
        self
    }

    /// The transaction this accessor is bound to, if it is still live.
    pub fn transaction(&self) -> Option<&Transaction> {
        self.live_transaction()
    }

    /// Executes a command and returns a single scalar result, using the
    /// accessor's default command kind.
    ///
    /// Output-capable entries in `params` hold the driver's output values
    /// after this returns.
    pub fn execute_scalar(&self, text: &str, params: &mut [Param]) -> Result<Value> {
        self.execute_scalar_with(text, self.inner.default_kind, params)
    }

    /// [`execute_scalar`](Dalc::execute_scalar) with an explicit command kind.
    pub fn execute_scalar_with(
        &self,
        text: &str,
        kind: CommandKind,
        params: &mut [Param],
    ) -> Result<Value> {
        normalize_params(params);
        let mut conn = self.acquire()?;

        let result = {
            let _logger = StatementLogger::new(text, self.inner.log_settings.clone());
            conn.with(|c| c.execute_scalar(text, kind, params))
        };

        conn.release();
        result.map_err(|source| Error::execute(source, command_context(text, params)))
    }

    /// Executes a command that returns no rows, using the accessor's default
    /// command kind. Returns the number of rows affected.
    pub fn execute_non_query(&self, text: &str, params: &mut [Param]) -> Result<u64> {
        self.execute_non_query_with(text, self.inner.default_kind, params)
    }

    /// [`execute_non_query`](Dalc::execute_non_query) with an explicit
    /// command kind.
    pub fn execute_non_query_with(
        &self,
        text: &str,
        kind: CommandKind,
        params: &mut [Param],
    ) -> Result<u64> {
        normalize_params(params);
        let mut conn = self.acquire()?;

        let result = {
            let _logger = StatementLogger::new(text, self.inner.log_settings.clone());
            conn.with(|c| c.execute_update(text, kind, params))
        };

        conn.release();
        result.map_err(|source| Error::execute(source, command_context(text, params)))
    }

    /// Executes a command and returns a lazy, forward-only cursor over its
    /// rows.
    ///
    /// The returned [`Reader`] owns the connection used to produce it: a
    /// connection opened for this one operation is closed when the reader is
    /// exhausted, explicitly closed or dropped — never eagerly. A connection
    /// owned by an active transaction is left open for the transaction.
    ///
    /// Output parameters are populated before this method returns, ahead of
    /// any row being read.
    pub fn execute_reader(&self, text: &str, params: &mut [Param]) -> Result<Reader> {
        normalize_params(params);
        let mut conn = self.acquire()?;

        let result = {
            let _logger = StatementLogger::new(text, self.inner.log_settings.clone());
            conn.with(|c| c.execute_query(text, self.inner.default_kind, params))
        };

        match result {
            Ok(cursor) => Ok(Reader::new(cursor, conn, command_context(text, params))),
            Err(source) => {
                conn.release();
                Err(Error::execute(source, command_context(text, params)))
            }
        }
    }

    /// Executes a command and eagerly materializes its rows, using the
    /// accessor's default command kind.
    ///
    /// Returns `Ok(None)` when the command produced no result set. The
    /// connection and cursor are released before this returns, on success
    /// and failure alike.
    pub fn execute_table(&self, text: &str, params: &mut [Param]) -> Result<Option<Table>> {
        self.execute_table_with(text, self.inner.default_kind, params)
    }

    /// [`execute_table`](Dalc::execute_table) with an explicit command kind.
    pub fn execute_table_with(
        &self,
        text: &str,
        kind: CommandKind,
        params: &mut [Param],
    ) -> Result<Option<Table>> {
        normalize_params(params);
        let mut conn = self.acquire()?;

        let result = {
            let _logger = StatementLogger::new(text, self.inner.log_settings.clone());
            conn.with(|c| {
                let Some(mut cursor) = c.execute_query(text, kind, params)? else {
                    return Ok(None);
                };

                let columns = Rc::new(Columns::new(cursor.columns()));
                let mut table = Table::new(columns);
                while let Some(values) = cursor.next_row()? {
                    table.push(values);
                }

                Ok(Some(table))
            })
        };

        conn.release();
        result.map_err(|source| Error::execute(source, command_context(text, params)))
    }

    /// Begins a transaction, making this accessor its owner.
    ///
    /// Acquires a fresh connection from the provider and starts a driver
    /// transaction on it; every subsequent operation on this accessor (and on
    /// any accessor created from the returned handle) runs on that
    /// connection.
    ///
    /// Fails with [`Error::InvalidOperation`] if this accessor already holds
    /// a live transaction.
    pub fn begin_transaction(&mut self) -> Result<Transaction> {
        if self.inner.closed {
            return Err(Error::InvalidOperation("accessor has been closed"));
        }
        if self.live_transaction().is_some() {
            return Err(Error::InvalidOperation(
                "a transaction is already in progress on this accessor",
            ));
        }

        let provider = self.inner.provider.as_ref().ok_or(Error::Argument(
            "accessor was constructed without a connection provider",
        ))?;

        let conn = provider.create_connection().map_err(Error::Database)?;
        let transaction = Transaction::begin(conn)?;

        self.inner.transaction = Some(transaction.clone());
        self.inner.owns_transaction = true;

        Ok(transaction)
    }

    /// Commits the held transaction. A no-op when none is held.
    pub fn commit(&self) -> Result<()> {
        match self.live_transaction() {
            Some(transaction) => transaction.commit(),
            None => Ok(()),
        }
    }

    /// Rolls back the held transaction. A no-op when none is held.
    pub fn rollback(&self) -> Result<()> {
        match self.live_transaction() {
            Some(transaction) => transaction.rollback(),
            None => Ok(()),
        }
    }

    /// Finalizes and releases any transaction this accessor owns.
    ///
    /// If the owned transaction was never committed or rolled back, the
    /// configured [`FinalizePolicy`] is applied first; the transaction's
    /// connection is then closed. Borrowed transactions are left untouched.
    ///
    /// Safe to call more than once. `Drop` performs the same teardown,
    /// logging any error instead of returning it.
    pub fn close(&mut self) -> Result<()> {
        if self.inner.closed {
            return Ok(());
        }
        self.inner.closed = true;

        let Some(transaction) = self.inner.transaction.take() else {
            return Ok(());
        };

        if !self.inner.owns_transaction || transaction.is_disposed() {
            return Ok(());
        }

        let finalized = if transaction.needs_finalization() {
            tracing::warn!(
                policy = ?self.inner.finalize_policy,
                "transaction was not explicitly finalized; applying finalize policy",
            );
            match self.inner.finalize_policy {
                FinalizePolicy::Commit => transaction.commit(),
                FinalizePolicy::Rollback => transaction.rollback(),
            }
        } else {
            Ok(())
        };

        // The connection is released even when finalization failed.
        let disposed = transaction.dispose();
        finalized.and(disposed)
    }

    fn live_transaction(&self) -> Option<&Transaction> {
        self.inner
            .transaction
            .as_ref()
            .filter(|transaction| !transaction.is_disposed())
    }

    /// Connection acquisition rule, uniform across every operation: reuse
    /// the live transaction's connection if one exists, otherwise open a
    /// fresh connection for the single operation.
    fn acquire(&self) -> Result<CommandConnection> {
        if let Some(transaction) = self.live_transaction() {
            return Ok(CommandConnection::shared(transaction.connection()));
        }

        let provider = self.inner.provider.as_ref().ok_or(Error::Argument(
            "accessor was constructed without a connection provider",
        ))?;

        let conn = provider.create_connection().map_err(Error::Database)?;
        Ok(CommandConnection::fresh(conn))
    }
}

impl Drop for Dalc {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            tracing::error!(%error, "error while closing accessor");
        }
    }
}

/// The connection backing one command, released on every exit path.
///
/// A fresh connection is closed on release (or on drop, whichever comes
/// first); a connection owned by a transaction is never closed here — its
/// lifetime belongs to the transaction.
pub(crate) struct CommandConnection {
    source: ConnectionSource,
}

enum ConnectionSource {
    Fresh(Option<Box<dyn Connection>>),
    Shared(SharedConnection),
}

impl CommandConnection {
    pub(crate) fn fresh(conn: Box<dyn Connection>) -> Self {
        CommandConnection {
            source: ConnectionSource::Fresh(Some(conn)),
        }
    }

    pub(crate) fn shared(conn: SharedConnection) -> Self {
        CommandConnection {
            source: ConnectionSource::Shared(conn),
        }
    }

    pub(crate) fn with<R>(
        &mut self,
        f: impl FnOnce(&mut dyn Connection) -> Result<R, BoxDynError>,
    ) -> Result<R, BoxDynError> {
        match &mut self.source {
            ConnectionSource::Fresh(Some(conn)) => f(conn.as_mut()),
            ConnectionSource::Fresh(None) => Err(Box::from("connection has been released")),
            ConnectionSource::Shared(shared) => {
                let mut conn = shared.borrow_mut();
                f(conn.as_mut())
            }
        }
    }

    pub(crate) fn release(&mut self) {
        if let ConnectionSource::Fresh(slot) = &mut self.source {
            if let Some(mut conn) = slot.take() {
                if let Err(error) = conn.close() {
                    tracing::error!(%error, "error closing connection");
                }
            }
        }
    }
}

impl Drop for CommandConnection {
    fn drop(&mut self) {
        self.release();
    }
}
