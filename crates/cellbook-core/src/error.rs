//! Error types for Cellbook core.

use cellbook_engine::engine::CellRef;
use thiserror::Error;

/// Errors that can occur while editing or loading a workbook
#[derive(Error, Debug)]
pub enum CellbookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid workbook: {0}")]
    InvalidWorkbook(String),

    #[error("Invalid cell reference: {0}")]
    InvalidReference(String),

    #[error("Cell {cell} is outside the {columns}x{rows} sheet")]
    OutOfBounds {
        cell: CellRef,
        columns: usize,
        rows: usize,
    },

    #[error("Invalid sheet size {columns}x{rows} (allowed 1..={max_columns} columns, 1..={max_rows} rows)")]
    InvalidDimensions {
        columns: usize,
        rows: usize,
        max_columns: usize,
        max_rows: usize,
    },

    #[error("Column {0} is outside the sheet")]
    ColumnOutOfBounds(usize),

    #[error("Row {0} is outside the sheet")]
    RowOutOfBounds(usize),

    #[error("Resize cancelled")]
    ResizeDeclined,

    #[error("Selection is empty")]
    EmptySelection,

    #[error("A workbook needs at least one sheet")]
    LastSheet,

    #[error("No sheet at index {0}")]
    SheetIndex(usize),

    #[error("No sheet named '{0}'")]
    UnknownSheet(String),

    #[error("Name must not be empty")]
    EmptyName,

    #[error("Unknown table style '{0}'")]
    UnknownTableStyle(String),

    #[error("CSV file is empty")]
    EmptyCsv,

    #[error("No file path set")]
    NoFilePath,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

pub type Result<T> = std::result::Result<T, CellbookError>;
