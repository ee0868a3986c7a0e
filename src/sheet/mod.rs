//! Concurrent shared spreadsheet.
//!
//! This module implements the sheet engine: a row-major grid of text cells
//! behind a three-tier locking protocol.
//!
//! # Architecture
//!
//! The row registry is a `RwLock<Vec<Arc<Mutex<Vec<String>>>>>`:
//!
//! - The outer `RwLock` is the **structure lock**. It guards the registry's
//!   length and ordering, not cell contents. Content operations and column
//!   insertion hold it in read mode; row insertion and snapshot load hold it
//!   in write mode.
//! - Each `Arc<Mutex<_>>` is one **row lock** that exclusively owns its
//!   row's content. The `Arc` gives every lock a stable identity: splicing
//!   the registry moves the pointers, never the lock objects, so a guard
//!   held through a clone of the `Arc` survives any splice.
//!
//! # Lock Order
//!
//! Outer to inner, on every path: admission gate, then (for save/load only)
//! the snapshot lock, then the structure lock, then row locks in ascending
//! index order. No operation re-acquires a lock it already holds; public
//! entry points take the locks and internal helpers work on held guards.

pub(crate) mod builder;
pub(crate) mod gate;
pub(crate) mod snapshot;
pub(crate) mod table;

pub use builder::SharedSheetBuilder;
pub use table::{SharedSheet, SheetError};
