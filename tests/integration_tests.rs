//! Integration tests for the gridshare sheet engine.

use gridshare::{SharedSheet, SheetError};

#[test]
fn test_basic_editing_scenario() {
    let sheet = SharedSheet::new(3, 3).unwrap();

    sheet.set_cell(1, 1, "X").unwrap();
    assert_eq!(sheet.get_cell(1, 1).unwrap(), "X");

    sheet.exchange_rows(0, 2).unwrap();
    for col in 0..3 {
        assert_eq!(sheet.get_cell(0, col).unwrap(), "");
    }
    assert_eq!(sheet.get_cell(1, 1).unwrap(), "X");

    sheet.add_row(0).unwrap();
    assert_eq!(sheet.size(), (4, 3));
    for col in 0..3 {
        assert_eq!(sheet.get_cell(1, col).unwrap(), "");
    }
    assert_eq!(sheet.get_cell(2, 1).unwrap(), "X");

    sheet.set_cell(0, 0, "x").unwrap();
    assert_eq!(sheet.find_all("X", true), vec![(2, 1)]);
}

#[test]
fn test_exchange_rows_is_self_inverse() {
    let sheet = SharedSheet::new(4, 3).unwrap();
    for row in 0..4 {
        for col in 0..3 {
            sheet.set_cell(row, col, format!("r{row}c{col}")).unwrap();
        }
    }

    sheet.exchange_rows(1, 3).unwrap();
    sheet.exchange_rows(1, 3).unwrap();

    for row in 0..4 {
        for col in 0..3 {
            assert_eq!(sheet.get_cell(row, col).unwrap(), format!("r{row}c{col}"));
        }
    }
}

#[test]
fn test_exchange_cols_is_self_inverse() {
    let sheet = SharedSheet::new(3, 4).unwrap();
    for row in 0..3 {
        for col in 0..4 {
            sheet.set_cell(row, col, format!("r{row}c{col}")).unwrap();
        }
    }

    sheet.exchange_cols(0, 2).unwrap();
    sheet.exchange_cols(0, 2).unwrap();

    for row in 0..3 {
        for col in 0..4 {
            assert_eq!(sheet.get_cell(row, col).unwrap(), format!("r{row}c{col}"));
        }
    }
}

#[test]
fn test_add_row_preserves_existing_content_and_order() {
    let sheet = SharedSheet::new(3, 2).unwrap();
    for row in 0..3 {
        sheet.set_cell(row, 0, format!("row{row}")).unwrap();
    }

    sheet.add_row(1).unwrap();

    assert_eq!(sheet.size(), (4, 2));
    assert_eq!(sheet.get_cell(0, 0).unwrap(), "row0");
    assert_eq!(sheet.get_cell(1, 0).unwrap(), "row1");
    assert_eq!(sheet.get_cell(2, 0).unwrap(), "");
    assert_eq!(sheet.get_cell(2, 1).unwrap(), "");
    assert_eq!(sheet.get_cell(3, 0).unwrap(), "row2");
}

#[test]
fn test_add_col_widens_all_rows_by_one() {
    let sheet = SharedSheet::new(3, 2).unwrap();
    for row in 0..3 {
        sheet.set_cell(row, 1, "last").unwrap();
    }

    sheet.add_col(1).unwrap();

    let (nrows, ncols) = sheet.size();
    assert_eq!((nrows, ncols), (3, 3));
    for row in 0..nrows {
        assert_eq!(sheet.get_cell(row, 1).unwrap(), "last");
        assert_eq!(sheet.get_cell(row, 2).unwrap(), "");
        assert!(matches!(
            sheet.get_cell(row, ncols),
            Err(SheetError::ColumnOutOfRange { .. })
        ));
    }
}

#[test]
fn test_set_all_is_scoped_by_case() {
    let sheet = SharedSheet::new(2, 3).unwrap();
    sheet.set_cell(0, 0, "total").unwrap();
    sheet.set_cell(0, 2, "Total").unwrap();
    sheet.set_cell(1, 1, "total").unwrap();

    assert_eq!(sheet.set_all("total", "sum", true), 2);
    assert_eq!(sheet.get_cell(0, 0).unwrap(), "sum");
    assert_eq!(sheet.get_cell(0, 2).unwrap(), "Total");

    assert_eq!(sheet.set_all("TOTAL", "sum", false), 1);
    assert_eq!(sheet.get_cell(0, 2).unwrap(), "sum");
}

#[test]
fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.snap");

    let sheet = SharedSheet::new(3, 4).unwrap();
    for row in 0..3 {
        for col in 0..4 {
            sheet.set_cell(row, col, format!("{row}:{col}")).unwrap();
        }
    }
    sheet.save(&path).unwrap();

    let copy = SharedSheet::new(1, 1).unwrap();
    copy.load(&path).unwrap();

    assert_eq!(copy.size(), (3, 4));
    for row in 0..3 {
        for col in 0..4 {
            assert_eq!(copy.get_cell(row, col).unwrap(), format!("{row}:{col}"));
        }
    }
}

#[test]
fn test_load_shrinks_larger_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.snap");

    let small = SharedSheet::new(2, 2).unwrap();
    small.set_cell(1, 1, "kept").unwrap();
    small.save(&path).unwrap();

    let big = SharedSheet::new(10, 10).unwrap();
    big.set_cell(9, 9, "dropped").unwrap();
    big.load(&path).unwrap();

    assert_eq!(big.size(), (2, 2));
    assert_eq!(big.get_cell(1, 1).unwrap(), "kept");
    assert!(matches!(
        big.get_cell(9, 9),
        Err(SheetError::RowOutOfRange { .. })
    ));
}

#[test]
fn test_load_missing_file_leaves_sheet_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.snap");

    let sheet = SharedSheet::new(2, 2).unwrap();
    sheet.set_cell(0, 0, "original").unwrap();

    let err = sheet.load(&path).unwrap_err();
    assert!(matches!(err, SheetError::SnapshotNotFound(_)));

    assert_eq!(sheet.size(), (2, 2));
    assert_eq!(sheet.get_cell(0, 0).unwrap(), "original");
}

#[test]
fn test_load_corrupt_file_leaves_sheet_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.snap");
    std::fs::write(&path, b"not a snapshot at all").unwrap();

    let sheet = SharedSheet::new(2, 2).unwrap();
    sheet.set_cell(0, 0, "original").unwrap();

    let err = sheet.load(&path).unwrap_err();
    assert!(matches!(err, SheetError::Io(_)));

    assert_eq!(sheet.size(), (2, 2));
    assert_eq!(sheet.get_cell(0, 0).unwrap(), "original");
}

#[test]
fn test_save_to_unwritable_path_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_such_dir").join("sheet.snap");

    let sheet = SharedSheet::new(2, 2).unwrap();
    sheet.set_cell(0, 0, "still here").unwrap();

    let err = sheet.save(&path).unwrap_err();
    assert!(matches!(err, SheetError::Io(_)));

    // A failed save never mutates the in-memory sheet.
    assert_eq!(sheet.get_cell(0, 0).unwrap(), "still here");
}

#[test]
fn test_saved_content_is_point_in_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snap.snap");

    let sheet = SharedSheet::new(2, 2).unwrap();
    sheet.set_cell(0, 0, "before").unwrap();
    sheet.save(&path).unwrap();
    sheet.set_cell(0, 0, "after").unwrap();

    let copy = SharedSheet::new(1, 1).unwrap();
    copy.load(&path).unwrap();
    assert_eq!(copy.get_cell(0, 0).unwrap(), "before");
}

#[test]
fn test_bounded_sheet_supports_all_operations() {
    // A bound of one exercises the gate on every entry point; any
    // operation that re-acquired the gate internally would deadlock here.
    let sheet = SharedSheet::builder().max_users(1).create(3, 3).unwrap();

    sheet.set_cell(0, 0, "v").unwrap();
    assert_eq!(sheet.get_cell(0, 0).unwrap(), "v");
    assert_eq!(sheet.search("v"), Some((0, 0)));
    assert_eq!(sheet.search_in_row(0, "v").unwrap(), Some(0));
    assert_eq!(sheet.search_in_col(0, "v").unwrap(), Some(0));
    assert_eq!(sheet.search_in_range(0, 2, 0, 2, "v").unwrap(), Some((0, 0)));
    sheet.exchange_rows(0, 1).unwrap();
    sheet.exchange_cols(0, 1).unwrap();
    sheet.add_row(0).unwrap();
    sheet.add_col(0).unwrap();
    assert_eq!(sheet.find_all("v", true).len(), 1);
    assert_eq!(sheet.set_all("v", "w", true), 1);
    assert_eq!(sheet.size(), (4, 4));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bounded.snap");
    sheet.save(&path).unwrap();
    sheet.load(&path).unwrap();
    assert_eq!(sheet.search("w"), Some((2, 2)));
}
