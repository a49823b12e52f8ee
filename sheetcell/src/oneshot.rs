//! Single-call helpers: open, read once, release
//!
//! Each function opens its own [`CellAccessor`] in [`AccessMode::Direct`]
//! with default settings, so a downloaded workbook is deleted before the
//! function returns, whether the read succeeded or not.

use crate::accessor::CellAccessor;
use crate::config::ReaderConfig;
use crate::error::Result;
use crate::reader::{AccessMode, CellCheck, CellRecord, CellValue};

fn with_accessor<T>(
    locator: &str,
    sheet: Option<&str>,
    read: impl FnOnce(&CellAccessor) -> Result<T>,
) -> Result<T> {
    let config = ReaderConfig::default().with_mode(AccessMode::Direct);
    let mut accessor = CellAccessor::open_with(config, locator, sheet)?;
    let result = read(&accessor);
    accessor.close();
    result
}

/// Value of one cell
pub fn read_cell(locator: &str, address: &str, sheet: Option<&str>) -> Result<CellValue> {
    with_accessor(locator, sheet, |a| a.read_cell(address))
}

/// Values of `start..=end` in row-major order
pub fn read_cell_range(
    locator: &str,
    start: &str,
    end: &str,
    sheet: Option<&str>,
) -> Result<Vec<CellValue>> {
    with_accessor(locator, sheet, |a| a.read_range(start, end))
}

pub fn is_cell_blank(locator: &str, address: &str, sheet: Option<&str>) -> Result<bool> {
    with_accessor(locator, sheet, |a| a.is_cell_blank(address))
}

/// Value, blank flag and data type of one cell
pub fn check_cell_value(locator: &str, address: &str, sheet: Option<&str>) -> Result<CellCheck> {
    with_accessor(locator, sheet, |a| a.check_cell(address))
}

/// Column scan; see [`CellAccessor::scan_column`]
pub fn read_all_cells_in_column(
    locator: &str,
    column: &str,
    start_row: Option<u32>,
    end_row: Option<u32>,
    sheet: Option<&str>,
) -> Result<Vec<CellRecord>> {
    with_accessor(locator, sheet, |a| a.scan_column(column, start_row, end_row))
}

/// Row scan; see [`CellAccessor::scan_row`]
pub fn read_all_cells_in_row(
    locator: &str,
    row: u32,
    start_column: Option<&str>,
    end_column: Option<&str>,
    sheet: Option<&str>,
) -> Result<Vec<CellRecord>> {
    with_accessor(locator, sheet, |a| a.scan_row(row, start_column, end_column))
}
