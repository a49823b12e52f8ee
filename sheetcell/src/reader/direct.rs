//! Lazily converted sheet backed by the decoder's range

use super::{SheetData, decode_value, range_extent};
use crate::reader::CellValue;
use calamine::{Data, Range};

pub struct DirectSheet {
    range: Range<Data>,
    rows: u32,
    cols: u32,
}

impl DirectSheet {
    pub fn new(range: Range<Data>) -> Self {
        let (rows, cols) = range_extent(&range);
        Self { range, rows, cols }
    }
}

impl SheetData for DirectSheet {
    fn cell(&self, row: u32, col: u32) -> CellValue {
        if !self.contains(row, col) {
            return CellValue::Empty;
        }
        // Absolute lookup; positions before the range start are simply absent
        self.range
            .get_value((row, col))
            .map(decode_value)
            .unwrap_or_default()
    }

    fn row_count(&self) -> u32 {
        self.rows
    }

    fn col_count(&self) -> u32 {
        self.cols
    }
}
