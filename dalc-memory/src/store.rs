use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use dalc_core::Value;

pub(crate) type SharedStore = Rc<RefCell<Store>>;

/// One named table: column names plus rows in insertion order.
#[derive(Debug, Clone, Default)]
pub(crate) struct TableData {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Vec<Value>>,
}

/// Committed state shared by every connection of one provider.
#[derive(Debug, Default)]
pub(crate) struct Store {
    pub(crate) tables: BTreeMap<String, TableData>,
    pub(crate) open_connections: usize,
}

/// A buffered write; connections hold these while a transaction is open and
/// apply them at commit.
#[derive(Debug, Clone)]
pub(crate) enum Op {
    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<Value>,
    },
    Delete {
        table: String,
    },
}

impl Store {
    /// Applies one write to committed state, returning rows affected.
    pub(crate) fn apply(&mut self, op: &Op) -> u64 {
        match op {
            Op::Insert {
                table,
                columns,
                values,
            } => {
                let data = self.tables.entry(table.clone()).or_default();
                if data.columns.is_empty() {
                    data.columns.clone_from(columns);
                }
                data.rows.push(values.clone());
                1
            }
            Op::Delete { table } => match self.tables.get_mut(table) {
                Some(data) => {
                    let affected = u64::try_from(data.rows.len()).unwrap_or(u64::MAX);
                    data.rows.clear();
                    affected
                }
                None => 0,
            },
        }
    }

    /// A view of `table` with `pending` writes replayed on top of committed
    /// state, so a transaction reads its own uncommitted work.
    pub(crate) fn view(&self, table: &str, pending: &[Op]) -> TableData {
        let mut data = self.tables.get(table).cloned().unwrap_or_default();

        for op in pending {
            match op {
                Op::Insert {
                    table: target,
                    columns,
                    values,
                } if target == table => {
                    if data.columns.is_empty() {
                        data.columns.clone_from(columns);
                    }
                    data.rows.push(values.clone());
                }
                Op::Delete { table: target } if target == table => {
                    data.rows.clear();
                }
                _ => {}
            }
        }

        data
    }
}
