//! Eagerly converted sheet held as a dense row-major table

use super::{SheetData, decode_value, range_extent};
use crate::reader::CellValue;
use calamine::{Data, Range};

/// Dense grid covering the populated block of a sheet.
///
/// Only the bounding box of stored cells is materialized; everything between
/// A1 and `origin` is implicitly empty.
#[derive(Debug, Clone, Default)]
pub struct TableSheet {
    origin: (u32, u32),
    width: u32,
    cells: Vec<CellValue>,
    rows: u32,
    cols: u32,
}

impl TableSheet {
    /// Convert a whole decoder range up front
    pub fn from_range(range: &Range<Data>) -> Self {
        let (rows, cols) = range_extent(range);
        let Some(origin) = range.start().filter(|_| rows > 0) else {
            return Self::default();
        };

        let width = cols - origin.1;
        let cells = range.rows().flat_map(|row| row.iter().map(decode_value)).collect();

        Self {
            origin,
            width,
            cells,
            rows,
            cols,
        }
    }

    /// Build a table from rows of values anchored at A1
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        if height == 0 || width == 0 {
            return Self::default();
        }

        let mut cells = Vec::with_capacity((height * width) as usize);
        for mut row in rows {
            row.resize(width as usize, CellValue::Empty);
            cells.extend(row);
        }

        Self {
            origin: (0, 0),
            width,
            cells,
            rows: height,
            cols: width,
        }
    }
}

impl SheetData for TableSheet {
    fn cell(&self, row: u32, col: u32) -> CellValue {
        if !self.contains(row, col) || row < self.origin.0 || col < self.origin.1 {
            return CellValue::Empty;
        }
        let index = (row - self.origin.0) as usize * self.width as usize
            + (col - self.origin.1) as usize;
        self.cells.get(index).cloned().unwrap_or_default()
    }

    fn row_count(&self) -> u32 {
        self.rows
    }

    fn col_count(&self) -> u32 {
        self.cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_pads_ragged_rows() {
        let table = TableSheet::from_rows(vec![
            vec!["a".into(), "b".into(), "c".into()],
            vec![1.0.into()],
        ]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.col_count(), 3);
        assert_eq!(table.cell(0, 2), CellValue::Text("c".to_string()));
        assert_eq!(table.cell(1, 0), CellValue::Number(1.0));
        assert_eq!(table.cell(1, 2), CellValue::Empty);
        assert_eq!(table.cell(2, 0), CellValue::Empty);
    }

    #[test]
    fn test_empty_table() {
        let table = TableSheet::from_rows(Vec::new());
        assert_eq!((table.row_count(), table.col_count()), (0, 0));
        assert_eq!(table.cell(0, 0), CellValue::Empty);
        assert_eq!(TableSheet::from_range(&Range::empty()).row_count(), 0);
    }
}
