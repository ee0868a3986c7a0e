use std::fmt;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use super::builder::SharedSheetBuilder;
use super::gate::AdmissionGate;
use super::snapshot::Snapshot;

/// One row of cells behind its row lock.
///
/// The `Arc` gives the lock a stable identity: splicing the registry moves
/// pointers, never the lock objects, so guards taken through a clone of the
/// `Arc` survive any registry mutation.
pub(crate) type RowSlot = Arc<Mutex<Vec<String>>>;

/// Errors that can occur when operating on a [`SharedSheet`].
#[derive(Debug)]
pub enum SheetError {
    /// A row index was outside the sheet's current row count.
    RowOutOfRange {
        /// The requested row index.
        row: usize,
        /// The row count at the time of the check.
        nrows: usize,
    },
    /// A column index was outside the sheet's current column count.
    ColumnOutOfRange {
        /// The requested column index.
        col: usize,
        /// The column count at the time of the check.
        ncols: usize,
    },
    /// The start of a search range exceeded its end.
    InvalidRange {
        /// Start index of the offending axis.
        start: usize,
        /// End index of the offending axis.
        end: usize,
    },
    /// A sheet must have at least one row and one column.
    InvalidDimensions,
    /// The snapshot file to load was not found.
    SnapshotNotFound(PathBuf),
    /// An I/O error occurred while reading or writing a snapshot.
    Io(io::Error),
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetError::RowOutOfRange { row, nrows } => {
                write!(f, "row index {row} out of range for {nrows} rows")
            }
            SheetError::ColumnOutOfRange { col, ncols } => {
                write!(f, "column index {col} out of range for {ncols} columns")
            }
            SheetError::InvalidRange { start, end } => {
                write!(f, "range start {start} exceeds range end {end}")
            }
            SheetError::InvalidDimensions => {
                write!(f, "a sheet requires at least one row and one column")
            }
            SheetError::SnapshotNotFound(path) => {
                write!(f, "snapshot file '{}' not found", path.display())
            }
            SheetError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for SheetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SheetError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SheetError {
    fn from(err: io::Error) -> Self {
        SheetError::Io(err)
    }
}

/// A shared spreadsheet of text cells, safe for concurrent use.
///
/// All cells hold text; new cells start empty. Every public operation takes
/// an admission ticket, then the structure lock, then the row locks it
/// needs, and releases everything in reverse order on every exit path. See
/// the [module docs](super) for the full locking protocol.
///
/// The sheet itself is the shared handle: wrap it in an [`Arc`] and clone
/// the `Arc` into every thread that needs access.
///
/// # Example
///
/// ```
/// use gridshare::SharedSheet;
///
/// # fn main() -> Result<(), gridshare::SheetError> {
/// let sheet = SharedSheet::new(2, 3)?;
/// sheet.set_cell(0, 2, "total")?;
/// assert_eq!(sheet.search("total"), Some((0, 2)));
/// assert_eq!(sheet.size(), (2, 3));
/// # Ok(())
/// # }
/// ```
pub struct SharedSheet {
    gate: AdmissionGate,
    /// Structure lock over the row registry. Read mode for content and
    /// per-row-width operations, write mode only when the registry itself
    /// is resized or replaced.
    rows: RwLock<Vec<RowSlot>>,
    /// Current column count. Updated when a column insertion completes;
    /// concurrent readers may observe the pre-mutation value.
    cols: AtomicUsize,
    /// Serializes save against save and against load.
    snapshot_lock: Mutex<()>,
}

impl SharedSheet {
    /// Creates a sheet of `nrows` x `ncols` empty cells with no admission
    /// bound.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::InvalidDimensions`] if either dimension is
    /// zero.
    pub fn new(nrows: usize, ncols: usize) -> Result<Self, SheetError> {
        Self::builder().create(nrows, ncols)
    }

    /// Returns a builder for configuring and creating a sheet.
    pub fn builder() -> SharedSheetBuilder {
        SharedSheetBuilder::new()
    }

    /// Internal implementation of create, called by the builder.
    pub(crate) fn create_with_builder(
        nrows: usize,
        ncols: usize,
        max_users: Option<usize>,
    ) -> Result<Self, SheetError> {
        if nrows == 0 || ncols == 0 {
            return Err(SheetError::InvalidDimensions);
        }

        let rows = (0..nrows)
            .map(|_| Arc::new(Mutex::new(vec![String::new(); ncols])))
            .collect();

        Ok(Self {
            gate: AdmissionGate::new(max_users),
            rows: RwLock::new(rows),
            cols: AtomicUsize::new(ncols),
            snapshot_lock: Mutex::new(()),
        })
    }

    /// Returns a copy of the cell text at `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::RowOutOfRange`] or
    /// [`SheetError::ColumnOutOfRange`] if the index is outside the sheet's
    /// current dimensions.
    pub fn get_cell(&self, row: usize, col: usize) -> Result<String, SheetError> {
        let _permit = self.gate.admit();
        let rows = self.rows.read().unwrap();
        let guard = Self::row_slot(&rows, row)?.lock().unwrap();
        match guard.get(col) {
            Some(cell) => Ok(cell.clone()),
            None => Err(SheetError::ColumnOutOfRange {
                col,
                ncols: guard.len(),
            }),
        }
    }

    /// Replaces the cell text at `(row, col)`.
    ///
    /// The new value is visible to subsequent reads once the row lock is
    /// released.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::RowOutOfRange`] or
    /// [`SheetError::ColumnOutOfRange`] if the index is outside the sheet's
    /// current dimensions.
    pub fn set_cell(
        &self,
        row: usize,
        col: usize,
        value: impl Into<String>,
    ) -> Result<(), SheetError> {
        let _permit = self.gate.admit();
        let rows = self.rows.read().unwrap();
        let mut guard = Self::row_slot(&rows, row)?.lock().unwrap();
        let ncols = guard.len();
        match guard.get_mut(col) {
            Some(cell) => {
                *cell = value.into();
                Ok(())
            }
            None => Err(SheetError::ColumnOutOfRange { col, ncols }),
        }
    }

    /// Searches the whole sheet for a cell equal to `needle`.
    ///
    /// Rows are scanned in index order, each under its own row lock, and
    /// the lock is released before the next row is examined. Returns the
    /// coordinates of the first match in row-major order, or `None`.
    pub fn search(&self, needle: &str) -> Option<(usize, usize)> {
        let _permit = self.gate.admit();
        let rows = self.rows.read().unwrap();
        for (row_idx, slot) in rows.iter().enumerate() {
            let guard = slot.lock().unwrap();
            if let Some(col_idx) = guard.iter().position(|cell| cell == needle) {
                return Some((row_idx, col_idx));
            }
        }
        None
    }

    /// Searches one row for a cell equal to `needle`, returning the column
    /// of the first match.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::RowOutOfRange`] if `row` is outside the
    /// sheet's current row count.
    pub fn search_in_row(&self, row: usize, needle: &str) -> Result<Option<usize>, SheetError> {
        let _permit = self.gate.admit();
        let rows = self.rows.read().unwrap();
        let guard = Self::row_slot(&rows, row)?.lock().unwrap();
        Ok(guard.iter().position(|cell| cell == needle))
    }

    /// Searches one column for a cell equal to `needle`, returning the row
    /// of the first match.
    ///
    /// Takes one row lock per row scanned, released between rows.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::ColumnOutOfRange`] if `col` is outside the
    /// sheet's current column count.
    pub fn search_in_col(&self, col: usize, needle: &str) -> Result<Option<usize>, SheetError> {
        let _permit = self.gate.admit();
        let rows = self.rows.read().unwrap();
        self.ensure_col(col)?;
        for (row_idx, slot) in rows.iter().enumerate() {
            let guard = slot.lock().unwrap();
            if guard.get(col).is_some_and(|cell| cell == needle) {
                return Ok(Some(row_idx));
            }
        }
        Ok(None)
    }

    /// Searches the rectangle `[r1..=r2] x [c1..=c2]` for a cell equal to
    /// `needle`, scanning row-major and stopping at the first match.
    ///
    /// Both range bounds are inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::InvalidRange`] if a range start exceeds its
    /// end, and [`SheetError::RowOutOfRange`] or
    /// [`SheetError::ColumnOutOfRange`] if the rectangle extends past the
    /// sheet's current dimensions.
    pub fn search_in_range(
        &self,
        r1: usize,
        r2: usize,
        c1: usize,
        c2: usize,
        needle: &str,
    ) -> Result<Option<(usize, usize)>, SheetError> {
        let _permit = self.gate.admit();
        let rows = self.rows.read().unwrap();

        if r1 > r2 {
            return Err(SheetError::InvalidRange { start: r1, end: r2 });
        }
        if c1 > c2 {
            return Err(SheetError::InvalidRange { start: c1, end: c2 });
        }
        if r2 >= rows.len() {
            return Err(SheetError::RowOutOfRange {
                row: r2,
                nrows: rows.len(),
            });
        }
        self.ensure_col(c2)?;

        for (row_idx, slot) in rows.iter().enumerate().take(r2 + 1).skip(r1) {
            let guard = slot.lock().unwrap();
            for col_idx in c1..=c2 {
                if guard.get(col_idx).is_some_and(|cell| cell == needle) {
                    return Ok(Some((row_idx, col_idx)));
                }
            }
        }
        Ok(None)
    }

    /// Swaps the entire content of two rows.
    ///
    /// Both row locks are acquired in ascending index order, which rules
    /// out circular waits between concurrent exchanges over overlapping
    /// pairs. Calling it twice with the same arguments restores the
    /// original content.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::RowOutOfRange`] if either index is outside
    /// the sheet's current row count.
    pub fn exchange_rows(&self, r1: usize, r2: usize) -> Result<(), SheetError> {
        let _permit = self.gate.admit();
        let rows = self.rows.read().unwrap();
        Self::row_slot(&rows, r1)?;
        Self::row_slot(&rows, r2)?;
        if r1 == r2 {
            // Locking the same row twice would deadlock; nothing to swap.
            return Ok(());
        }

        let (lo, hi) = (r1.min(r2), r1.max(r2));
        let mut lo_guard = rows[lo].lock().unwrap();
        let mut hi_guard = rows[hi].lock().unwrap();
        mem::swap(&mut *lo_guard, &mut *hi_guard);
        Ok(())
    }

    /// Swaps the content of two columns across every row.
    ///
    /// Rows are visited in index order, each under its own row lock. The
    /// swap is atomic per row, not across the whole sheet. Self-inverse in
    /// the absence of concurrent writers.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::ColumnOutOfRange`] if either index is outside
    /// the sheet's current column count.
    pub fn exchange_cols(&self, c1: usize, c2: usize) -> Result<(), SheetError> {
        let _permit = self.gate.admit();
        let rows = self.rows.read().unwrap();
        self.ensure_col(c1)?;
        self.ensure_col(c2)?;
        if c1 == c2 {
            return Ok(());
        }

        for slot in rows.iter() {
            let mut guard = slot.lock().unwrap();
            if c1 < guard.len() && c2 < guard.len() {
                guard.swap(c1, c2);
            }
        }
        Ok(())
    }

    /// Inserts a new all-blank row immediately after `after`.
    ///
    /// Takes the structure lock in write mode, then every row lock in
    /// ascending order, since the registry itself is extended and all
    /// higher indices shift. Existing rows keep their relative order and
    /// content.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::RowOutOfRange`] if `after` is outside the
    /// sheet's current row count.
    pub fn add_row(&self, after: usize) -> Result<(), SheetError> {
        let _permit = self.gate.admit();
        let mut rows = self.rows.write().unwrap();
        if after >= rows.len() {
            return Err(SheetError::RowOutOfRange {
                row: after,
                nrows: rows.len(),
            });
        }

        // Lock through clones of the Arcs so the guards do not borrow the
        // vector being spliced.
        let slots: Vec<RowSlot> = rows.iter().map(Arc::clone).collect();
        let guards: Vec<_> = slots.iter().map(|slot| slot.lock().unwrap()).collect();

        let width = guards[0].len();
        rows.insert(after + 1, Arc::new(Mutex::new(vec![String::new(); width])));
        drop(guards);
        Ok(())
    }

    /// Inserts a blank cell at position `after + 1` in every row.
    ///
    /// Holds the structure lock in read mode and widens one row at a time
    /// under its own row lock; the registry itself is untouched, so column
    /// insertion runs concurrently with content operations. Readers may
    /// transiently observe rows of unequal width while the insertion is in
    /// flight. The reported column count is bumped once every row has been
    /// widened.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::ColumnOutOfRange`] if `after` is outside the
    /// sheet's current column count.
    pub fn add_col(&self, after: usize) -> Result<(), SheetError> {
        let _permit = self.gate.admit();
        let rows = self.rows.read().unwrap();
        self.ensure_col(after)?;

        for slot in rows.iter() {
            let mut guard = slot.lock().unwrap();
            // Row widths never shrink, so `after + 1` is always in bounds.
            guard.insert(after + 1, String::new());
        }
        self.cols.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Returns the coordinates of every cell equal to `needle`, in
    /// row-major order.
    ///
    /// With `case_sensitive` the comparison is byte-exact; without it the
    /// comparison ignores case (Unicode lowercase folding).
    pub fn find_all(&self, needle: &str, case_sensitive: bool) -> Vec<(usize, usize)> {
        let _permit = self.gate.admit();
        let rows = self.rows.read().unwrap();
        let folded = (!case_sensitive).then(|| needle.to_lowercase());

        let mut matches = Vec::new();
        for (row_idx, slot) in rows.iter().enumerate() {
            let guard = slot.lock().unwrap();
            for (col_idx, cell) in guard.iter().enumerate() {
                if cell_matches(cell, needle, folded.as_deref()) {
                    matches.push((row_idx, col_idx));
                }
            }
        }
        matches
    }

    /// Rewrites every cell equal to `old` with `new`, honoring
    /// `case_sensitive` as in [`find_all`](Self::find_all). Returns the
    /// number of cells rewritten.
    ///
    /// Rows are rewritten one at a time under their own locks; the
    /// replacement is not atomic across the whole sheet, so a concurrent
    /// reader may observe a state where only some matches have been
    /// replaced.
    pub fn set_all(&self, old: &str, new: &str, case_sensitive: bool) -> usize {
        let _permit = self.gate.admit();
        let rows = self.rows.read().unwrap();
        let folded = (!case_sensitive).then(|| old.to_lowercase());

        let mut replaced = 0;
        for slot in rows.iter() {
            let mut guard = slot.lock().unwrap();
            for cell in guard.iter_mut() {
                if cell_matches(cell, old, folded.as_deref()) {
                    *cell = new.to_string();
                    replaced += 1;
                }
            }
        }
        replaced
    }

    /// Returns the current `(rows, columns)` dimensions.
    ///
    /// Takes no row locks. May race benignly with an in-flight
    /// [`add_row`](Self::add_row) or [`add_col`](Self::add_col), returning
    /// the pre- or post-mutation size, never a torn value.
    pub fn size(&self) -> (usize, usize) {
        let _permit = self.gate.admit();
        let rows = self.rows.read().unwrap();
        (rows.len(), self.cols.load(Ordering::Acquire))
    }

    /// Writes a point-in-time snapshot of the sheet to `path`.
    ///
    /// The content is captured under the structure lock and every row lock,
    /// then encoded and written after the table locks are released; only
    /// the snapshot lock, which serializes save against save and against
    /// load, is held across the file I/O. On failure the error is returned
    /// and the in-memory sheet is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SheetError> {
        let path = path.as_ref();
        let _permit = self.gate.admit();
        let _io_guard = self.snapshot_lock.lock().unwrap();

        let snapshot = {
            let rows = self.rows.write().unwrap();
            let slots: Vec<RowSlot> = rows.iter().map(Arc::clone).collect();
            let guards: Vec<_> = slots.iter().map(|slot| slot.lock().unwrap()).collect();
            Snapshot::new(guards.iter().map(|guard| (**guard).clone()).collect())
        };

        snapshot.write_to_path(path)?;

        #[cfg(feature = "logging")]
        log::info!(
            "saved {}x{} sheet snapshot to {}",
            snapshot.nrows(),
            snapshot.ncols(),
            path.display()
        );

        Ok(())
    }

    /// Replaces the sheet's content with the snapshot stored at `path`.
    ///
    /// The file is read and decoded before any table lock is taken; if the
    /// file is missing or fails to decode, the existing sheet is left
    /// untouched. Existing rows keep their lock identity and have their
    /// content overwritten in place; the registry grows with fresh locks
    /// when the snapshot has more rows and shrinks when it has fewer.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::SnapshotNotFound`] if `path` does not exist
    /// and [`SheetError::Io`] if it cannot be read or decoded.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(), SheetError> {
        let path = path.as_ref();
        let _permit = self.gate.admit();
        let _io_guard = self.snapshot_lock.lock().unwrap();

        let snapshot = Snapshot::read_from_path(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                SheetError::SnapshotNotFound(path.to_path_buf())
            } else {
                SheetError::Io(e)
            }
        })?;

        let (new_rows, new_cols) = (snapshot.nrows(), snapshot.ncols());

        let mut rows = self.rows.write().unwrap();
        let slots: Vec<RowSlot> = rows.iter().map(Arc::clone).collect();
        let mut guards: Vec<_> = slots.iter().map(|slot| slot.lock().unwrap()).collect();

        let mut content = snapshot.into_rows().into_iter();
        for guard in guards.iter_mut() {
            if let Some(row) = content.next() {
                **guard = row;
            }
        }
        drop(guards);

        if new_rows < rows.len() {
            rows.truncate(new_rows);
        } else {
            for row in content {
                rows.push(Arc::new(Mutex::new(row)));
            }
        }
        self.cols.store(new_cols, Ordering::Release);

        #[cfg(feature = "logging")]
        log::info!(
            "loaded {}x{} sheet snapshot from {}",
            new_rows,
            new_cols,
            path.display()
        );

        Ok(())
    }

    /// Looks up a row slot in an already-locked registry.
    fn row_slot<'a>(rows: &'a [RowSlot], row: usize) -> Result<&'a RowSlot, SheetError> {
        rows.get(row).ok_or(SheetError::RowOutOfRange {
            row,
            nrows: rows.len(),
        })
    }

    /// Validates a column index against the current column count.
    fn ensure_col(&self, col: usize) -> Result<(), SheetError> {
        let ncols = self.cols.load(Ordering::Acquire);
        if col < ncols {
            Ok(())
        } else {
            Err(SheetError::ColumnOutOfRange { col, ncols })
        }
    }
}

/// Compares a cell against the needle. `folded` carries the pre-lowercased
/// needle when the comparison ignores case.
fn cell_matches(cell: &str, needle: &str, folded: Option<&str>) -> bool {
    match folded {
        Some(folded) => cell.to_lowercase() == folded,
        None => cell == needle,
    }
}
