//! Excel/ODS file reader using calamine
//!
//! A workbook is exposed through [`SpreadsheetSource`] (sheet enumeration and
//! loading) and each loaded worksheet through [`SheetData`] (0-based cell
//! lookup plus the populated extent). Two backing strategies share that
//! contract and differ only in cost:
//!
//! - [`AccessMode::Direct`] keeps the decoder's range and converts a cell each
//!   time it is read. Cheap to open, suited to a few scattered reads.
//! - [`AccessMode::Table`] converts the whole sheet once into a dense grid.
//!   Costlier to open, suited to ranges and whole-column/row scans.

use crate::error::{Result, SheetError};
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub mod direct;
pub mod table;
pub mod workbook;

pub use direct::DirectSheet;
pub use table::TableSheet;
pub use workbook::{CellCheck, CellRecord, CellValue, ScanAxis};

/// A decoded worksheet
pub trait SheetData: Send {
    /// Value at 0-based (row, col); `Empty` outside the populated extent
    fn cell(&self, row: u32, col: u32) -> CellValue;

    /// Rows up to and including the last populated one
    fn row_count(&self) -> u32;

    /// Columns up to and including the last populated one
    fn col_count(&self) -> u32;

    /// Check if (row, col) lies inside the populated extent
    fn contains(&self, row: u32, col: u32) -> bool {
        row < self.row_count() && col < self.col_count()
    }
}

/// An opened workbook document
pub trait SpreadsheetSource: Send {
    /// Sheet names in document order
    fn sheet_names(&self) -> Vec<String>;

    /// Decode one worksheet by name
    fn load_sheet(&mut self, name: &str) -> Result<Box<dyn SheetData>>;
}

/// Strategy used to back a loaded sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Convert cells lazily on each read
    #[default]
    Direct,
    /// Convert the whole sheet into a dense table on load
    Table,
}

/// Workbook opened from a local file with calamine
pub struct CalamineSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
    mode: AccessMode,
}

impl CalamineSource {
    /// Open a workbook; the format is detected from the file extension
    pub fn open<P: AsRef<Path>>(path: P, mode: AccessMode) -> Result<Self> {
        let path = path.as_ref();
        let workbook = open_workbook_auto(path).map_err(|source| SheetError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("opened workbook {} ({:?} mode)", path.display(), mode);

        Ok(Self {
            path: path.to_path_buf(),
            workbook,
            mode,
        })
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }
}

impl SpreadsheetSource for CalamineSource {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn load_sheet(&mut self, name: &str) -> Result<Box<dyn SheetData>> {
        let range = self
            .workbook
            .worksheet_range(name)
            .map_err(|source| SheetError::Workbook {
                path: self.path.clone(),
                source,
            })?;

        Ok(match self.mode {
            AccessMode::Direct => Box::new(DirectSheet::new(range)),
            AccessMode::Table => Box::new(TableSheet::from_range(&range)),
        })
    }
}

/// In-memory workbook, mainly for callers that already hold decoded data
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: Vec<(String, TableSheet)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet (document order is insertion order)
    pub fn with_sheet(mut self, name: impl Into<String>, sheet: TableSheet) -> Self {
        self.sheets.push((name.into(), sheet));
        self
    }
}

impl SpreadsheetSource for MemorySource {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn load_sheet(&mut self, name: &str) -> Result<Box<dyn SheetData>> {
        self.sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, sheet)| Box::new(sheet.clone()) as Box<dyn SheetData>)
            .ok_or_else(|| SheetError::SheetNotFound {
                name: name.to_string(),
                available: self.sheet_names(),
            })
    }
}

/// Populated extent of a decoder range as (rows, cols) counted from A1
pub(crate) fn range_extent(range: &Range<Data>) -> (u32, u32) {
    match range.end() {
        Some((row, col)) if !range.is_empty() => (row.saturating_add(1), col.saturating_add(1)),
        _ => (0, 0),
    }
}

/// Map a decoder value to a [`CellValue`]; empty strings count as no data
pub(crate) fn decode_value(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(e) => CellValue::Text(e.to_string()),
        Data::Empty => CellValue::Empty,
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
