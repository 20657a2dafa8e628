use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use crate::dalc::CommandConnection;
use crate::driver::RowCursor;
use crate::error::{Error, Result};
use crate::row::{Columns, Row};

/// A lazy, forward-only, single-pass cursor over the rows of a result set.
///
/// The reader owns the connection used to produce it. When that connection
/// was opened for this one operation, it is closed as soon as the reader is
/// exhausted, explicitly [`close`](Reader::close)d, or dropped. A connection
/// owned by an active transaction is never closed by the reader.
///
/// `Reader` implements [`Iterator`]; a driver error while advancing ends the
/// iteration after yielding the error.
pub struct Reader {
    cursor: Option<Box<dyn RowCursor>>,
    columns: Rc<Columns>,
    conn: CommandConnection,
    command: String,
}

impl Reader {
    pub(crate) fn new(
        cursor: Option<Box<dyn RowCursor>>,
        conn: CommandConnection,
        command: String,
    ) -> Self {
        let columns = Rc::new(
            cursor
                .as_ref()
                .map(|cursor| Columns::new(cursor.columns()))
                .unwrap_or_default(),
        );

        Reader {
            cursor,
            columns,
            conn,
            command,
        }
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Advances to the next row.
    ///
    /// Returns `Ok(None)` once the result set is exhausted; the underlying
    /// connection is released at that point.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };

        match cursor.next_row() {
            Ok(Some(values)) => Ok(Some(Row::new(Rc::clone(&self.columns), values))),
            Ok(None) => {
                self.release();
                Ok(None)
            }
            Err(source) => {
                self.release();
                Err(Error::execute(source, self.command.clone()))
            }
        }
    }

    /// Stops reading and releases the underlying connection. Idempotent;
    /// dropping the reader has the same effect.
    pub fn close(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.cursor = None;
        self.conn.release();
    }
}

impl Iterator for Reader {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl Debug for Reader {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("command", &self.command)
            .field("exhausted", &self.cursor.is_none())
            .finish()
    }
}
