use std::vec;

use dalc_core::driver::{Connection, RowCursor};
use dalc_core::{BoxDynError, CommandKind, Param, Value};

use crate::store::{Op, SharedStore, TableData};

/// A single connection to the shared in-memory store.
///
/// A transaction buffers its writes in `pending` and applies them to the
/// store at commit; until then they are visible only through this
/// connection. Closing with an open transaction discards the buffer.
pub(crate) struct MemoryConnection {
    store: SharedStore,
    pending: Option<Vec<Op>>,
    closed: bool,
}

/// What a parsed command produced.
enum Outcome {
    Affected(u64),
    Count(usize),
    Rows(TableData),
}

impl MemoryConnection {
    pub(crate) fn new(store: SharedStore) -> Self {
        store.borrow_mut().open_connections += 1;
        MemoryConnection {
            store,
            pending: None,
            closed: false,
        }
    }

    fn check_open(&self) -> Result<(), BoxDynError> {
        if self.closed {
            return Err(Box::from("connection is closed"));
        }
        Ok(())
    }

    fn view(&self, table: &str) -> TableData {
        self.store
            .borrow()
            .view(table, self.pending.as_deref().unwrap_or(&[]))
    }

    fn write(&mut self, op: Op) -> u64 {
        if self.pending.is_none() {
            return self.store.borrow_mut().apply(&op);
        }

        let affected = match &op {
            Op::Insert { .. } => 1,
            Op::Delete { table } => u64::try_from(self.view(table).rows.len()).unwrap_or(u64::MAX),
        };
        if let Some(pending) = self.pending.as_mut() {
            pending.push(op);
        }
        affected
    }

    /// Interprets the memory driver's command vocabulary:
    /// `insert <table>`, `delete <table>`, `count <table>`, `select <table>`.
    fn run(&mut self, text: &str, params: &mut [Param]) -> Result<Outcome, BoxDynError> {
        self.check_open()?;

        let mut words = text.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| BoxDynError::from("empty command text"))?;
        let table = words.next();

        match verb {
            "insert" => {
                let table = required_table(table, "insert")?;
                let mut columns = Vec::new();
                let mut values = Vec::new();
                for param in params.iter().filter(|p| p.is_input()) {
                    columns.push(param.name.clone());
                    values.push(param.value.clone());
                }
                Ok(Outcome::Affected(self.write(Op::Insert {
                    table: table.to_owned(),
                    columns,
                    values,
                })))
            }
            "delete" => {
                let table = required_table(table, "delete")?;
                Ok(Outcome::Affected(self.write(Op::Delete {
                    table: table.to_owned(),
                })))
            }
            "count" => {
                let table = required_table(table, "count")?;
                let count = self.view(table).rows.len();
                // output parameters are populated here, before any cursor is
                // handed back to the caller
                let count_value = Value::Integer(i64::try_from(count).unwrap_or(i64::MAX));
                for param in params.iter_mut().filter(|p| !p.is_input()) {
                    param.value = count_value.clone();
                }
                Ok(Outcome::Count(count))
            }
            "select" => {
                let table = required_table(table, "select")?;
                Ok(Outcome::Rows(self.view(table)))
            }
            _ => Err(format!("unrecognized command `{verb}`").into()),
        }
    }
}

fn required_table<'a>(table: Option<&'a str>, verb: &str) -> Result<&'a str, BoxDynError> {
    table.ok_or_else(|| format!("`{verb}` requires a table name").into())
}

impl Connection for MemoryConnection {
    fn begin(&mut self) -> Result<(), BoxDynError> {
        self.check_open()?;
        if self.pending.is_some() {
            return Err(Box::from("transaction already in progress on this connection"));
        }
        self.pending = Some(Vec::new());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BoxDynError> {
        self.check_open()?;
        let pending = self
            .pending
            .take()
            .ok_or_else(|| BoxDynError::from("no transaction in progress"))?;
        let mut store = self.store.borrow_mut();
        for op in &pending {
            store.apply(op);
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), BoxDynError> {
        self.check_open()?;
        self.pending
            .take()
            .ok_or_else(|| BoxDynError::from("no transaction in progress"))?;
        Ok(())
    }

    fn execute_scalar(
        &mut self,
        text: &str,
        _kind: CommandKind,
        params: &mut [Param],
    ) -> Result<Value, BoxDynError> {
        match self.run(text, params)? {
            Outcome::Affected(n) => Ok(Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))),
            Outcome::Count(n) => Ok(Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))),
            Outcome::Rows(data) => Ok(data
                .rows
                .first()
                .and_then(|row| row.first())
                .cloned()
                .unwrap_or(Value::Null)),
        }
    }

    fn execute_update(
        &mut self,
        text: &str,
        _kind: CommandKind,
        params: &mut [Param],
    ) -> Result<u64, BoxDynError> {
        match self.run(text, params)? {
            Outcome::Affected(n) => Ok(n),
            Outcome::Count(_) | Outcome::Rows(_) => Ok(0),
        }
    }

    fn execute_query(
        &mut self,
        text: &str,
        _kind: CommandKind,
        params: &mut [Param],
    ) -> Result<Option<Box<dyn RowCursor>>, BoxDynError> {
        match self.run(text, params)? {
            // writes produce no result set
            Outcome::Affected(_) => Ok(None),
            Outcome::Count(n) => Ok(Some(Box::new(MemoryRowCursor {
                columns: vec!["count".to_owned()],
                rows: vec![vec![Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))]]
                    .into_iter(),
            }))),
            Outcome::Rows(data) => Ok(Some(Box::new(MemoryRowCursor {
                columns: data.columns,
                rows: data.rows.into_iter(),
            }))),
        }
    }

    fn close(&mut self) -> Result<(), BoxDynError> {
        if !self.closed {
            self.closed = true;
            // an open transaction is discarded, never half-applied
            self.pending = None;
            self.store.borrow_mut().open_connections -= 1;
        }
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            self.store.borrow_mut().open_connections -= 1;
        }
    }
}

struct MemoryRowCursor {
    columns: Vec<String>,
    rows: vec::IntoIter<Vec<Value>>,
}

impl RowCursor for MemoryRowCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>, BoxDynError> {
        Ok(self.rows.next())
    }
}
