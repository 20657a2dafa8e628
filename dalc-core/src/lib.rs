//! Core of DALC: a transaction-aware data access layer over pluggable,
//! synchronous database drivers.
//!
//! The two central types are [`Dalc`], the accessor that executes
//! parameterized commands, and [`Transaction`], a shared handle to one unit
//! of work. An accessor either owns a private connection per operation, or —
//! after [`Dalc::begin_transaction`] — runs everything on the transaction's
//! connection. Further accessors can be created from the same handle with
//! [`Dalc::from_transaction`] so several logical data-access objects share
//! one transaction; exactly one of them (the creator) owns it and finalizes
//! it at teardown.
//!
//! Drivers plug in through the traits in [`driver`]; the accessor never
//! inspects driver-specific types.
//!
//! The execution model is single-threaded and blocking throughout. Types
//! here are deliberately `!Send`: sharing across threads is out of scope.

pub mod command;
pub mod dalc;
pub mod driver;
pub mod error;
pub mod logger;
pub mod reader;
pub mod row;
pub mod transaction;
pub mod value;

pub use command::{CommandKind, Direction, Param, DEFAULT_OUTPUT_SIZE};
pub use dalc::{Dalc, FinalizePolicy};
pub use error::{BoxDynError, Error, Result};
pub use logger::LogSettings;
pub use reader::Reader;
pub use row::{Columns, Row, Table};
pub use transaction::Transaction;
pub use value::Value;
