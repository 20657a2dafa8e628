use std::rc::Rc;
use std::slice;

use indexmap::IndexMap;

use crate::value::Value;

/// Column metadata shared by every row of one result set.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    ordinals: IndexMap<String, usize>,
}

impl Columns {
    pub(crate) fn new(names: &[String]) -> Self {
        let mut ordinals = IndexMap::with_capacity(names.len());
        for (ordinal, name) in names.iter().enumerate() {
            ordinals.insert(name.clone(), ordinal);
        }
        Columns { ordinals }
    }

    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }

    /// Position of the named column within a row, if present.
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.ordinals.get(name).copied()
    }

    /// Column names in result-set order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ordinals.keys().map(String::as_str)
    }
}

/// A single materialized row.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Rc<Columns>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Rc<Columns>, values: Vec<Value>) -> Self {
        Row { columns, values }
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value of the named column.
    ///
    /// # Panics
    ///
    /// Panics if there is no column with that name. Use
    /// [`try_get`](Row::try_get) for a fallible lookup.
    pub fn get(&self, name: &str) -> &Value {
        match self.try_get(name) {
            Some(value) => value,
            None => panic!("no column named `{name}`"),
        }
    }

    pub fn try_get(&self, name: &str) -> Option<&Value> {
        self.values.get(self.columns.ordinal(name)?)
    }

    /// The value at the given ordinal, if in range.
    pub fn value(&self, ordinal: usize) -> Option<&Value> {
        self.values.get(ordinal)
    }
}

/// An eagerly materialized result set.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Rc<Columns>,
    rows: Vec<Row>,
}

impl Table {
    pub(crate) fn new(columns: Rc<Columns>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, values: Vec<Value>) {
        self.rows.push(Row::new(Rc::clone(&self.columns), values));
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Row;
    type IntoIter = slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
