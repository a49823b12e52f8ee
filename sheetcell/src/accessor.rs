//! Cell access session over one worksheet
//!
//! A [`CellAccessor`] moves through `Unopened -> Opened -> Closed`. Opening
//! resolves the locator to a local file, decodes the workbook and selects a
//! sheet; closing drops the sheet and releases the file (deleting it when it
//! was a temporary download). Reads are only valid while opened.

use crate::address::{CellAddress, CellRange, column_index, format_address};
use crate::config::ReaderConfig;
use crate::error::{Result, SheetError};
use crate::reader::{
    CalamineSource, CellCheck, CellRecord, CellValue, SheetData, SpreadsheetSource,
};
use crate::source::{Locator, SourceLease, SourceResolver};
use log::debug;
use std::mem;

/// Selected worksheet plus the file it was read from
struct SheetHandle {
    sheet_name: String,
    sheet_names: Vec<String>,
    data: Box<dyn SheetData>,
    // Declared last so the sheet is gone before the file is released
    lease: Option<SourceLease>,
}

impl SheetHandle {
    fn load(source: &mut dyn SpreadsheetSource, sheet: Option<&str>) -> Result<Self> {
        let sheet_names = source.sheet_names();
        let sheet_name = match sheet {
            Some(name) if sheet_names.iter().any(|n| n == name) => name.to_string(),
            Some(name) => {
                return Err(SheetError::SheetNotFound {
                    name: name.to_string(),
                    available: sheet_names,
                });
            }
            None => sheet_names
                .first()
                .cloned()
                .ok_or_else(|| SheetError::SheetNotFound {
                    name: "<first sheet>".to_string(),
                    available: Vec::new(),
                })?,
        };

        let data = source.load_sheet(&sheet_name)?;
        debug!(
            "selected sheet '{}' ({} rows x {} columns populated)",
            sheet_name,
            data.row_count(),
            data.col_count()
        );

        Ok(Self {
            sheet_name,
            sheet_names,
            data,
            lease: None,
        })
    }

    fn release(self) {
        let Self { data, lease, .. } = self;
        drop(data);
        if let Some(lease) = lease {
            lease.release();
        }
    }
}

enum State {
    Unopened,
    Opened(SheetHandle),
    Closed,
}

/// Reads cells, ranges and scans from one worksheet of a workbook
pub struct CellAccessor {
    config: ReaderConfig,
    resolver: Option<SourceResolver>,
    state: State,
}

impl CellAccessor {
    /// Unopened accessor; the resolver is built from `[remote]` on first open
    pub fn new(config: ReaderConfig) -> Self {
        Self {
            config,
            resolver: None,
            state: State::Unopened,
        }
    }

    /// Unopened accessor using an explicit resolver
    pub fn with_resolver(config: ReaderConfig, resolver: SourceResolver) -> Self {
        Self {
            config,
            resolver: Some(resolver),
            state: State::Unopened,
        }
    }

    /// Create and open in one call
    pub fn open_with(config: ReaderConfig, locator: &str, sheet: Option<&str>) -> Result<Self> {
        let mut accessor = Self::new(config);
        accessor.open(locator, sheet)?;
        Ok(accessor)
    }

    /// Accessor over an already opened document, e.g. a [`MemorySource`]
    ///
    /// [`MemorySource`]: crate::reader::MemorySource
    pub fn from_source(
        config: ReaderConfig,
        source: &mut dyn SpreadsheetSource,
        sheet: Option<&str>,
    ) -> Result<Self> {
        let mut accessor = Self::new(config);
        accessor.open_source(source, sheet)?;
        Ok(accessor)
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Opened(_))
    }

    /// Resolve `locator`, open the workbook and select `sheet` (first sheet
    /// when `None`).
    ///
    /// Any failure releases the resolved file before returning.
    pub fn open(&mut self, locator: &str, sheet: Option<&str>) -> Result<()> {
        self.ensure_not_open()?;
        let locator = Locator::parse(locator)?;

        if self.resolver.is_none() {
            self.resolver = Some(SourceResolver::from_config(&self.config.remote)?);
        }
        let lease = match &self.resolver {
            Some(resolver) => resolver.resolve(&locator)?,
            None => return Err(SheetError::InvalidState("no source resolver available")),
        };

        // On error `source` is dropped before `lease`, closing the file first
        let mut source = CalamineSource::open(lease.path(), self.config.reader.mode)?;
        let mut handle = SheetHandle::load(&mut source, sheet)?;
        drop(source);
        handle.lease = Some(lease);
        debug!("opened {} sheet '{}'", locator, handle.sheet_name);

        self.state = State::Opened(handle);
        Ok(())
    }

    /// Select `sheet` from an already opened document
    pub fn open_source(
        &mut self,
        source: &mut dyn SpreadsheetSource,
        sheet: Option<&str>,
    ) -> Result<()> {
        self.ensure_not_open()?;
        self.state = State::Opened(SheetHandle::load(source, sheet)?);
        Ok(())
    }

    /// Drop the sheet and release the file; no-op unless opened
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        if let State::Opened(handle) = mem::replace(&mut self.state, State::Closed) {
            debug!("closing sheet '{}'", handle.sheet_name);
            handle.release();
        }
    }

    /// All sheet names of the open workbook, in document order
    pub fn sheet_names(&self) -> Result<&[String]> {
        Ok(&self.handle()?.sheet_names)
    }

    /// Name of the selected sheet
    pub fn sheet_name(&self) -> Result<&str> {
        Ok(&self.handle()?.sheet_name)
    }

    /// Populated extent of the selected sheet as (rows, columns) from A1
    pub fn extent(&self) -> Result<(u32, u32)> {
        let data = &self.handle()?.data;
        Ok((data.row_count(), data.col_count()))
    }

    /// Value at `address`; `Empty` beyond the populated extent
    pub fn read_cell(&self, address: &str) -> Result<CellValue> {
        let handle = self.handle()?;
        let addr = CellAddress::parse(address)?;
        Ok(handle.data.cell(addr.row, addr.col))
    }

    /// Values of the rectangle `start..=end` in row-major order
    pub fn read_range(&self, start: &str, end: &str) -> Result<Vec<CellValue>> {
        let handle = self.handle()?;
        let range = CellRange::from_addresses(start, end)?;
        Ok(range
            .iter()
            .map(|addr| handle.data.cell(addr.row, addr.col))
            .collect())
    }

    pub fn is_cell_blank(&self, address: &str) -> Result<bool> {
        Ok(self.read_cell(address)?.is_blank())
    }

    /// Value, blank flag and data type of one cell
    pub fn check_cell(&self, address: &str) -> Result<CellCheck> {
        let handle = self.handle()?;
        let addr = CellAddress::parse(address)?;
        Ok(CellCheck::new(addr, handle.data.cell(addr.row, addr.col)))
    }

    /// Walk `column` downward from `start_row` (default 1).
    ///
    /// With `end_row` every row through it is returned. Without it the walk
    /// stops before the first empty cell below the start; the start cell is
    /// always returned, even past `max_scan_rows`; no later row above that
    /// ceiling is visited.
    pub fn scan_column(
        &self,
        column: &str,
        start_row: Option<u32>,
        end_row: Option<u32>,
    ) -> Result<Vec<CellRecord>> {
        let handle = self.handle()?;
        let col = column_index(column)?;
        let start = start_row.unwrap_or(1);
        if start == 0 {
            return Err(SheetError::InvalidAddress(format!("{}{}", column, start)));
        }

        let records: Vec<CellRecord> = walk(start, end_row, self.config.reader.max_scan_rows, |n| {
            handle.data.cell(n - 1, col)
        })
        .into_iter()
        .map(|(n, value)| CellRecord::in_column(CellAddress::new(n - 1, col), value))
        .collect();

        debug!(
            "column scan {} from row {}: {} cells",
            column,
            start,
            records.len()
        );
        Ok(records)
    }

    /// Walk `row` rightward from `start_column` (default `A`).
    ///
    /// Mirrors [`CellAccessor::scan_column`], bounded by `max_scan_columns`.
    pub fn scan_row(
        &self,
        row: u32,
        start_column: Option<&str>,
        end_column: Option<&str>,
    ) -> Result<Vec<CellRecord>> {
        let handle = self.handle()?;
        let start_letters = start_column.unwrap_or("A");
        if row == 0 {
            return Err(SheetError::InvalidAddress(format!("{}{}", start_letters, row)));
        }
        // Column numbers are 1-based from here on
        let start = column_index(start_letters)? + 1;
        let end = end_column.map(column_index).transpose()?.map(|c| c + 1);

        let records: Vec<CellRecord> = walk(start, end, self.config.reader.max_scan_columns, |n| {
            handle.data.cell(row - 1, n - 1)
        })
        .into_iter()
        .map(|(n, value)| CellRecord::in_row(CellAddress::new(row - 1, n - 1), value))
        .collect();

        debug!(
            "row scan {} from {}: {} cells",
            row,
            format_address(row - 1, start - 1),
            records.len()
        );
        Ok(records)
    }

    fn handle(&self) -> Result<&SheetHandle> {
        match &self.state {
            State::Opened(handle) => Ok(handle),
            State::Unopened => Err(SheetError::InvalidState("accessor has not been opened")),
            State::Closed => Err(SheetError::InvalidState("accessor has been closed")),
        }
    }

    fn ensure_not_open(&self) -> Result<()> {
        if self.is_open() {
            return Err(SheetError::InvalidState("accessor is already open"));
        }
        Ok(())
    }
}

/// Walk 1-based positions from `start`, returning (position, value) pairs.
///
/// `start` is always read unless `end` lies before it. Later positions stop
/// at `ceiling`, at `end` when given, and otherwise at the first empty value.
fn walk(
    start: u32,
    end: Option<u32>,
    ceiling: u32,
    read: impl Fn(u32) -> CellValue,
) -> Vec<(u32, CellValue)> {
    let mut cells = Vec::new();
    for position in start..=end.unwrap_or(u32::MAX) {
        if position > start && position > ceiling {
            break;
        }
        let value = read(position);
        if position > start && end.is_none() && value.is_empty() {
            break;
        }
        cells.push((position, value));
    }
    cells
}

impl Drop for CellAccessor {
    fn drop(&mut self) {
        self.close();
    }
}
