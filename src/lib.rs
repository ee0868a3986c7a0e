//! # gridshare
//!
//! A shared, mutable, in-process spreadsheet of text cells that many threads
//! may read and write concurrently.
//!
//! The engine is built around a three-tier locking protocol:
//!
//! - An [`admission gate`](sheet::SharedSheetBuilder::max_users) bounds how
//!   many operations may be inside the sheet at once (unbounded by default).
//! - A structure lock (reader/writer) guards the *shape* of the row registry:
//!   its length and the row-to-lock mapping. Content operations share it in
//!   read mode; only row insertion and snapshot load take it in write mode.
//! - Per-row locks grant exclusive access to one row's content. Multi-row
//!   operations acquire them in ascending index order, which rules out
//!   circular waits.
//!
//! Whole-sheet persistence serializes through a dedicated snapshot lock, so
//! a save always captures a point-in-time image and a load either replaces
//! the content wholesale or leaves the sheet untouched.
//!
//! # Concurrency Model
//!
//! - Thread A can edit row 0 while thread B edits row 5; neither blocks the
//!   other.
//! - Searches lock one row at a time and release it before moving on, so a
//!   long scan never stalls writers for more than one row.
//! - Column insertion widens rows one at a time under their own locks;
//!   readers may transiently observe rows of unequal width while it runs.
//!   Row insertion is fully exclusive and never exposes a partial splice.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gridshare::SharedSheet;
//!
//! # fn main() -> Result<(), gridshare::SheetError> {
//! let sheet = Arc::new(SharedSheet::new(3, 3)?);
//!
//! std::thread::scope(|s| {
//!     let writer = Arc::clone(&sheet);
//!     s.spawn(move || {
//!         writer.set_cell(1, 1, "hello").unwrap();
//!     });
//!
//!     let reader = Arc::clone(&sheet);
//!     s.spawn(move || {
//!         let _ = reader.search("hello");
//!     });
//! });
//!
//! assert_eq!(sheet.get_cell(1, 1)?, "hello");
//! # Ok(())
//! # }
//! ```

pub mod sheet;

pub use sheet::{SharedSheet, SharedSheetBuilder, SheetError};
