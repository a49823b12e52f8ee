//! Blank / null / N/A classification

use crate::reader::CellValue;

/// Placeholder strings treated as "no real data", compared after trimming
/// and ASCII uppercasing.
pub const BLANK_TOKENS: [&str; 7] = ["", "N/A", "NA", "NULL", "NONE", "#N/A", "#NA"];

/// Check if a value is blank, null, or N/A
pub fn is_blank(value: &CellValue) -> bool {
    match value {
        CellValue::Empty => true,
        CellValue::Text(text) => {
            let trimmed = text.trim();
            BLANK_TOKENS
                .iter()
                .any(|token| trimmed.eq_ignore_ascii_case(token))
        }
        CellValue::Number(_) | CellValue::Boolean(_) => false,
    }
}
