use super::table::{SharedSheet, SheetError};

/// Builder for configuring and creating a [`SharedSheet`].
///
/// # Example
///
/// ```
/// use gridshare::SharedSheet;
///
/// # fn main() -> Result<(), gridshare::SheetError> {
/// let sheet = SharedSheet::builder()
///     .max_users(8)
///     .create(100, 26)?;
/// # Ok(())
/// # }
/// ```
pub struct SharedSheetBuilder {
    max_users: Option<usize>,
}

impl SharedSheetBuilder {
    /// Creates a new builder with default settings (no admission bound).
    pub fn new() -> Self {
        Self { max_users: None }
    }

    /// Bounds the number of operations that may be inside the sheet
    /// concurrently.
    ///
    /// Once `limit` operations are past the admission gate, further callers
    /// block until one of them finishes. The bound is fixed for the
    /// lifetime of the sheet.
    ///
    /// Default: unbounded.
    #[must_use]
    pub fn max_users(mut self, limit: usize) -> Self {
        self.max_users = Some(limit);
        self
    }

    /// Creates a sheet of `nrows` x `ncols` empty cells.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::InvalidDimensions`] if either dimension is
    /// zero.
    pub fn create(self, nrows: usize, ncols: usize) -> Result<SharedSheet, SheetError> {
        SharedSheet::create_with_builder(nrows, ncols, self.max_users)
    }
}

impl Default for SharedSheetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
