//! sheetcell: cell-addressable reads of Excel/ODS workbooks
//!
//! Workbooks are located by filesystem path or `s3://bucket/key` URI. A
//! [`CellAccessor`] opens one worksheet and reads single cells, rectangular
//! ranges, and contiguous runs down a column or along a row. Values that are
//! empty or hold a placeholder such as `N/A` or `null` are classified as
//! blank.
//!
//! ```no_run
//! use sheetcell::{CellAccessor, ReaderConfig};
//!
//! # fn main() -> sheetcell::Result<()> {
//! let mut accessor = CellAccessor::open_with(ReaderConfig::default(), "data.xlsx", None)?;
//! let name = accessor.read_cell("A2")?;
//! let ages = accessor.scan_column("B", Some(2), None)?;
//! accessor.close();
//! # let _ = (name, ages);
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod address;
pub mod blank;
pub mod config;
pub mod error;
pub mod oneshot;
pub mod reader;
pub mod source;

pub use accessor::CellAccessor;
pub use address::{CellAddress, CellRange};
pub use blank::is_blank;
pub use config::ReaderConfig;
pub use error::{Result, SheetError};
pub use reader::{AccessMode, CellCheck, CellRecord, CellValue, ScanAxis};
pub use source::{Locator, SourceLease, SourceResolver};
