//! In-memory driver for DALC.
//!
//! Exists so the accessor and its transaction lifecycle can be exercised
//! without an external database; it backs the integration test suite and is
//! handy for examples and prototyping. Not a real query engine: it
//! interprets a four-verb command vocabulary.
//!
//! - `insert <table>` — appends one row; the input parameters supply column
//!   names and values. Tables are created on first insert.
//! - `delete <table>` — removes every row; reports rows affected.
//! - `count <table>` — counts rows; the count is also written to every
//!   output-capable parameter.
//! - `select <table>` — produces the table's rows, in insertion order.
//!
//! [`CommandKind::StoredProcedure`](dalc_core::CommandKind) is accepted and
//! treated as text. Transactions buffer writes per connection and apply them
//! at commit; a transaction reads its own uncommitted writes, other
//! connections do not.

mod connection;
mod store;

use std::cell::RefCell;
use std::rc::Rc;

use dalc_core::driver::{Connection, DataProvider};
use dalc_core::BoxDynError;

use crate::connection::MemoryConnection;
use crate::store::Store;

/// Connection provider backed by a shared in-memory store.
///
/// Clones share the same store, so data inserted through one provider handle
/// is visible through its clones.
#[derive(Clone, Default)]
pub struct MemoryProvider {
    store: Rc<RefCell<Store>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of driver connections currently open against this store.
    pub fn open_connections(&self) -> usize {
        self.store.borrow().open_connections
    }
}

impl DataProvider for MemoryProvider {
    fn create_connection(&self) -> Result<Box<dyn Connection>, BoxDynError> {
        Ok(Box::new(MemoryConnection::new(Rc::clone(&self.store))))
    }
}
