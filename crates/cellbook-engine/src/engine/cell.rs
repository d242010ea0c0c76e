//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`CellContent`] - What the user typed, classified once at write time
//! - [`CellValue`] - The derived value (number, text, or an error sentinel)
//! - [`CellStyle`] - Presentation attributes, independent of content
//! - [`Cell`] - Raw input, content, value and style together
//! - [`Grid`] - Sparse storage for cells (backed by `DashMap`)

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::cell_ref::CellRef;
use super::format::format_number;

/// Classified content of a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellContent {
    /// No content; the cell only exists to carry a style.
    Empty,
    Number(f64),
    Text(String),
    /// Formula body without the leading `=`.
    Formula(String),
}

/// Evaluation failure sentinels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellError {
    /// Parse or evaluation failure.
    Err,
    /// The cell takes part in a circular reference.
    Cycle,
}

impl CellError {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Err => "#ERR",
            CellError::Cycle => "#CYCLE",
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computed value of a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Error(CellError),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    /// Text shown to the user for this value.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Error(e) => e.as_str().to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// Next alignment in the left -> center -> right cycle.
    pub fn next(self) -> Align {
        match self {
            Align::Left => Align::Center,
            Align::Center => Align::Right,
            Align::Right => Align::Left,
        }
    }
}

/// Which sides of a cell carry a border line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderSpec {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl BorderSpec {
    pub const ALL: BorderSpec = BorderSpec {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };

    pub fn is_empty(&self) -> bool {
        !(self.top || self.right || self.bottom || self.left)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CellStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align: Align,
    pub wrap: bool,
    pub fill: Option<String>,
    pub border: Option<BorderSpec>,
}

/// A cell in the spreadsheet grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Exactly what the user entered.
    pub raw_input: String,
    pub content: CellContent,
    /// Derived value. Formula cells are stale until the next recalculation.
    pub value: CellValue,
    pub style: Option<CellStyle>,
}

impl Cell {
    /// Classify user input into a cell.
    /// - Empty after trimming trailing newlines -> None (the cell is removed)
    /// - Starts with '=' -> Formula (without the '=')
    /// - Parses fully as a finite number -> Number
    /// - Otherwise -> Text
    pub fn from_input(raw_input: &str) -> Option<Cell> {
        let text = raw_input.trim_end_matches(['\n', '\r']);
        if text.is_empty() {
            return None;
        }

        let (content, value) = if let Some(body) = text.strip_prefix('=') {
            (CellContent::Formula(body.to_string()), CellValue::Empty)
        } else if let Some(n) = parse_number_literal(text) {
            (CellContent::Number(n), CellValue::Number(n))
        } else {
            (
                CellContent::Text(text.to_string()),
                CellValue::Text(text.to_string()),
            )
        };

        Some(Cell {
            raw_input: raw_input.to_string(),
            content,
            value,
            style: None,
        })
    }

    /// A content-less cell that only carries a style.
    pub fn style_only(style: CellStyle) -> Cell {
        Cell {
            raw_input: String::new(),
            content: CellContent::Empty,
            value: CellValue::Empty,
            style: Some(style),
        }
    }

    pub fn with_style(mut self, style: Option<CellStyle>) -> Cell {
        self.style = style;
        self
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.content, CellContent::Formula(_))
    }

    pub fn formula_body(&self) -> Option<&str> {
        match &self.content {
            CellContent::Formula(body) => Some(body),
            _ => None,
        }
    }

    /// Text shown to the user: the computed value for formulas, the entered
    /// text for literals.
    pub fn display(&self) -> String {
        match &self.content {
            CellContent::Empty => String::new(),
            CellContent::Formula(_) => self.value.display(),
            CellContent::Number(_) | CellContent::Text(_) => self
                .raw_input
                .trim_end_matches(['\n', '\r'])
                .to_string(),
        }
    }
}

/// Parse a numeric literal the way a cell edit does: the whole (whitespace
/// trimmed) text must be a finite decimal number.
pub(crate) fn parse_number_literal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Sparse grid storage.
pub type Grid = DashMap<CellRef, Cell>;

pub fn new_grid() -> Grid {
    DashMap::new()
}
