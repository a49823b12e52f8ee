//! Cell value data structures

use crate::address::CellAddress;
use crate::blank;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cell value types
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Check if the cell holds no data
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell is blank, null, or N/A
    pub fn is_blank(&self) -> bool {
        blank::is_blank(self)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the value kind, as reported by cell checks
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Boolean(_) => "boolean",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            // Whole numbers print without a trailing ".0"
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

/// Position of a scanned cell along the scan axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanAxis {
    /// 1-based row number, reported by column scans
    Row(u64),
    /// Column letters, reported by row scans
    Column(String),
}

/// One cell visited by a row or column scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRecord {
    pub address: CellAddress,
    pub value: CellValue,
    pub is_blank: bool,
    #[serde(flatten)]
    pub axis: ScanAxis,
}

impl CellRecord {
    /// Record for a column scan (axis reports the row number)
    pub fn in_column(address: CellAddress, value: CellValue) -> Self {
        let is_blank = value.is_blank();
        Self {
            address,
            value,
            is_blank,
            axis: ScanAxis::Row(address.row_number()),
        }
    }

    /// Record for a row scan (axis reports the column letters)
    pub fn in_row(address: CellAddress, value: CellValue) -> Self {
        let is_blank = value.is_blank();
        Self {
            address,
            value,
            is_blank,
            axis: ScanAxis::Column(address.column_letters()),
        }
    }
}

/// Result of inspecting a single cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellCheck {
    pub address: CellAddress,
    pub value: CellValue,
    pub is_blank: bool,
    pub data_type: &'static str,
}

impl CellCheck {
    pub fn new(address: CellAddress, value: CellValue) -> Self {
        Self {
            address,
            is_blank: value.is_blank(),
            data_type: value.type_name(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_numbers() {
        assert_eq!(CellValue::Number(30.0).to_string(), "30");
        assert_eq!(CellValue::Number(-2.5).to_string(), "-2.5");
        assert_eq!(CellValue::Boolean(true).to_string(), "TRUE");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_record_serialization_shape() {
        let record = CellRecord::in_column(CellAddress::new(1, 1), "x".into());
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"address": "B2", "value": "x", "is_blank": false, "row": 2})
        );

        let record = CellRecord::in_row(CellAddress::new(4, 27), CellValue::Empty);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"address": "AB5", "value": null, "is_blank": true, "column": "AB"})
        );
    }

    #[test]
    fn test_check_reports_type() {
        let check = CellCheck::new(CellAddress::new(0, 2), CellValue::Text("N/A".into()));
        assert!(check.is_blank);
        assert_eq!(check.data_type, "text");
        assert_eq!(CellCheck::new(CellAddress::new(0, 0), 0.0.into()).data_type, "number");
    }
}
