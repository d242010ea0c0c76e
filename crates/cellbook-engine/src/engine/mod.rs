//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`Cell`], [`CellContent`], [`Grid`] - Data structures for cell storage
//! - [`CellRef`], [`CellRange`], [`GridBounds`] - A1 addressing
//! - [`resolve`] - Extract cell and range references from formula text
//! - [`parse_formula`] - Tokenize and parse a formula body
//! - [`DependencyGraph`] / [`detect_cycle`] - Precedent/dependent bookkeeping
//! - [`recalculate`] - Full, memoized, cycle-safe recalculation pass
//! - [`format_number`] - Format values for display

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod eval;
mod format;
mod graph;
mod parser;

pub use cell::{
    Align, BorderSpec, Cell, CellContent, CellError, CellStyle, CellValue, Grid, new_grid,
};
pub use cell_ref::{CellRange, CellRef, GridBounds};
pub use cycle::detect_cycle;
pub use deps::{Reference, ResolvedRefs, parse_reference, resolve};
pub use eval::{RecalcSummary, evaluate_formula, recalculate};
pub use format::format_number;
pub use graph::DependencyGraph;
pub use parser::{BinaryOp, Expr, FormulaError, parse_formula};
