//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed column/row coordinates, plus
//! the rectangular [`CellRange`] and the [`GridBounds`] of a sheet.
//!
//! # Examples
//!
//! ```
//! use cellbook_engine::engine::CellRef;
//!
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A reference to a cell by column and row indices (0-indexed).
///
/// Ordering is row-major: `A1 < B1 < A2`.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "B2", "AA10").
    /// Column letters must be uppercase. Returns None if the input is invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_a1(name)
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name)?;
        let letters = &caps["letters"];
        let numbers = &caps["numbers"];

        let mut col_acc = 0usize;
        for c in letters.bytes() {
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        let col = col_acc.checked_sub(1)?;

        let row = numbers.parse::<usize>().ok()?.checked_sub(1)?;

        Some(CellRef::new(col, row))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

fn a1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Z]+)(?<numbers>[0-9]+)$").expect("A1 regex must compile")
    })
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

/// An inclusive rectangle of cells, normalized so `start` is the top-left corner.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    /// Build the rectangle spanned by two corners, in any order.
    pub fn from_corners(a: CellRef, b: CellRef) -> CellRange {
        CellRange {
            start: CellRef::new(a.col.min(b.col), a.row.min(b.row)),
            end: CellRef::new(a.col.max(b.col), a.row.max(b.row)),
        }
    }

    pub fn single(cell: CellRef) -> CellRange {
        CellRange {
            start: cell,
            end: cell,
        }
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        cell.row >= self.start.row
            && cell.row <= self.end.row
            && cell.col >= self.start.col
            && cell.col <= self.end.col
    }

    pub fn width(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    pub fn height(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    /// Number of cells, or None on overflow.
    pub fn cell_count(&self) -> Option<usize> {
        self.width().checked_mul(self.height())
    }

    /// Iterate over every member cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + use<> {
        let (start, end) = (self.start, self.end);
        (start.row..=end.row)
            .flat_map(move |row| (start.col..=end.col).map(move |col| CellRef::new(col, row)))
    }

    /// Intersect with the sheet bounds; None when nothing remains.
    pub fn clip(&self, bounds: GridBounds) -> Option<CellRange> {
        if !bounds.contains(&self.start) {
            return None;
        }
        let end = CellRef::new(
            self.end.col.min(bounds.columns - 1),
            self.end.row.min(bounds.rows - 1),
        );
        Some(CellRange {
            start: self.start,
            end,
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Column and row counts of a sheet. Both are at least 1.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub columns: usize,
    pub rows: usize,
}

impl GridBounds {
    pub fn new(columns: usize, rows: usize) -> GridBounds {
        GridBounds { columns, rows }
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        cell.col < self.columns && cell.row < self.rows
    }
}
