//! DALC — a lightweight, transaction-aware data access layer over pluggable
//! synchronous database drivers.
//!
//! The facade re-exports everything from `dalc-core`; drivers are enabled
//! through cargo features (the bundled [`MemoryProvider`] via `memory`, on
//! by default).
//!
//! # Quickstart
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use dalc::{Dalc, MemoryProvider, Param};
//!
//! fn main() -> dalc::Result<()> {
//!     let provider = Rc::new(MemoryProvider::new());
//!
//!     let mut dalc = Dalc::new(provider.clone());
//!     let tx = dalc.begin_transaction()?;
//!
//!     dalc.execute_non_query("insert notes", &mut [Param::new("str", "hello")])?;
//!
//!     // a second accessor joins the same unit of work; dropping it leaves
//!     // the transaction untouched
//!     let shared = Dalc::from_transaction(&tx)?;
//!     shared.execute_non_query("insert notes", &mut [Param::new("str", "world")])?;
//!     drop(shared);
//!
//!     tx.commit()?;
//!     dalc.close()?;
//!
//!     let count = Dalc::new(provider).execute_scalar("count notes", &mut [])?;
//!     assert_eq!(count.as_integer(), Some(2));
//!     Ok(())
//! }
//! ```

pub use dalc_core::*;

#[cfg(feature = "memory")]
pub use dalc_memory::MemoryProvider;
