//! The driver seam: traits a database backend implements to plug into DALC.
//!
//! The accessor treats these as opaque factories and never inspects
//! driver-specific types. Everything is synchronous; a call blocks until the
//! underlying round-trip completes. Timeout behavior, if any, belongs to the
//! driver.

use crate::command::{CommandKind, Param};
use crate::error::BoxDynError;
use crate::value::Value;

/// A factory for driver connections.
pub trait DataProvider {
    /// Opens a new connection to the underlying database.
    fn create_connection(&self) -> Result<Box<dyn Connection>, BoxDynError>;
}

/// A single open driver connection.
///
/// Transactions are connection-scoped: after [`begin`](Connection::begin),
/// every command on this connection runs inside the transaction until
/// [`commit`](Connection::commit) or [`rollback`](Connection::rollback).
pub trait Connection {
    /// Starts a transaction on this connection.
    fn begin(&mut self) -> Result<(), BoxDynError>;

    /// Commits the transaction started with [`begin`](Connection::begin).
    fn commit(&mut self) -> Result<(), BoxDynError>;

    /// Rolls back the transaction started with [`begin`](Connection::begin).
    fn rollback(&mut self) -> Result<(), BoxDynError>;

    /// Executes a command and returns the first column of the first row of
    /// its result, or [`Value::Null`] when it produced none.
    fn execute_scalar(
        &mut self,
        text: &str,
        kind: CommandKind,
        params: &mut [Param],
    ) -> Result<Value, BoxDynError>;

    /// Executes a command and returns the number of rows affected.
    fn execute_update(
        &mut self,
        text: &str,
        kind: CommandKind,
        params: &mut [Param],
    ) -> Result<u64, BoxDynError>;

    /// Executes a command that may produce rows.
    ///
    /// Returns `None` when the command produced no result set.
    ///
    /// Contract: output-capable parameters in `params` must be populated
    /// before this method returns, not when the cursor is first advanced —
    /// some backends only materialize output buffers at execution time.
    fn execute_query(
        &mut self,
        text: &str,
        kind: CommandKind,
        params: &mut [Param],
    ) -> Result<Option<Box<dyn RowCursor>>, BoxDynError>;

    /// Closes the connection, releasing any driver-side resources.
    fn close(&mut self) -> Result<(), BoxDynError>;
}

/// A forward-only, single-pass cursor over the rows of one result set.
pub trait RowCursor {
    /// Column names, in result-set order.
    fn columns(&self) -> &[String];

    /// Advances the cursor, returning the next row's values or `None` when
    /// the result set is exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<Value>>, BoxDynError>;
}
