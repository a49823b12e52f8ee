//! A1-style cell addresses and rectangular ranges
//!
//! Columns use bijective base-26 letters (`A`..`Z`, `AA`..), rows are 1-based
//! in the string form. Internally both coordinates are 0-based.

use crate::error::{Result, SheetError};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

static CELL_REF: OnceLock<Regex> = OnceLock::new();

fn cell_ref_regex() -> &'static Regex {
    CELL_REF.get_or_init(|| Regex::new(r"^([A-Za-z]+)([0-9]+)$").unwrap())
}

/// Convert column letters (case-insensitive) to a 0-based column index
pub fn column_index(letters: &str) -> Result<u32> {
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(SheetError::InvalidAddress(letters.to_string()));
    }

    let mut value = 0u32;
    for b in letters.bytes() {
        let digit = u32::from(b.to_ascii_uppercase() - b'A') + 1;
        value = value
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| SheetError::InvalidAddress(letters.to_string()))?;
    }

    // Non-empty input, so value >= 1
    Ok(value - 1)
}

/// Convert a 0-based column index to letters (0 -> A, 25 -> Z, 26 -> AA)
pub fn column_letters(col: u32) -> String {
    let mut n = u64::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Format 0-based coordinates as an A1-style address
pub fn format_address(row: u32, col: u32) -> String {
    CellAddress::new(row, col).to_string()
}

/// A cell position, 0-based on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an address such as `C5` or `aa10`
    pub fn parse(address: &str) -> Result<Self> {
        let invalid = || SheetError::InvalidAddress(address.to_string());
        let caps = cell_ref_regex().captures(address).ok_or_else(invalid)?;

        let col = column_index(&caps[1])?;
        let row_number: u32 = caps[2].parse().map_err(|_| invalid())?;
        if row_number == 0 {
            return Err(invalid());
        }

        Ok(Self {
            row: row_number - 1,
            col,
        })
    }

    /// 1-based row number as written in the address
    pub fn row_number(&self) -> u64 {
        u64::from(self.row) + 1
    }

    /// Column letters of this address
    pub fn column_letters(&self) -> String {
        column_letters(self.col)
    }
}

impl FromStr for CellAddress {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column_letters(), self.row_number())
    }
}

impl Serialize for CellAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl PartialOrd for CellAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row.cmp(&other.row).then_with(|| self.col.cmp(&other.col))
    }
}

/// Rectangular block of cells, both corners inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    start: CellAddress,
    end: CellAddress,
}

impl CellRange {
    /// Build a range; `start` must not lie after `end` on either axis
    pub fn new(start: CellAddress, end: CellAddress) -> Result<Self> {
        if start.row > end.row || start.col > end.col {
            return Err(SheetError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Build a range from two address strings
    pub fn from_addresses(start: &str, end: &str) -> Result<Self> {
        Self::new(CellAddress::parse(start)?, CellAddress::parse(end)?)
    }

    /// Parse a range like "A1:B2"
    pub fn parse(range: &str) -> Result<Self> {
        let (start, end) = range
            .split_once(':')
            .ok_or_else(|| SheetError::InvalidAddress(range.to_string()))?;
        Self::from_addresses(start, end)
    }

    pub fn start(&self) -> CellAddress {
        self.start
    }

    pub fn end(&self) -> CellAddress {
        self.end
    }

    pub fn row_count(&self) -> u64 {
        u64::from(self.end.row - self.start.row) + 1
    }

    pub fn col_count(&self) -> u64 {
        u64::from(self.end.col - self.start.col) + 1
    }

    /// Number of cells in the range
    pub fn len(&self) -> u64 {
        self.row_count() * self.col_count()
    }

    /// A valid range always holds at least one cell
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, address: CellAddress) -> bool {
        (self.start.row..=self.end.row).contains(&address.row)
            && (self.start.col..=self.end.col).contains(&address.col)
    }

    /// Addresses in row-major order
    pub fn iter(&self) -> impl Iterator<Item = CellAddress> + '_ {
        (self.start.row..=self.end.row).flat_map(move |row| {
            (self.start.col..=self.end.col).map(move |col| CellAddress::new(row, col))
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
