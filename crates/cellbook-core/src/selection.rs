//! The selection model: a set of selected cells with an anchor.
//!
//! A click selects one cell, shift+click selects the rectangle between the
//! anchor and the target, ctrl+click toggles one cell. Multiple disjoint
//! rectangles arise from toggling; rectangle-based editing operations use
//! [`Selection::bounds`].

use std::collections::BTreeSet;

use cellbook_engine::engine::{CellRange, CellRef, GridBounds};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    anchor: Option<CellRef>,
    cells: BTreeSet<CellRef>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the anchor cell (for extending selections).
    pub fn anchor(&self) -> Option<CellRef> {
        self.anchor
    }

    /// Selected cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &CellRef> + '_ {
        self.cells.iter()
    }

    pub fn contains(&self, cell_ref: &CellRef) -> bool {
        self.cells.contains(cell_ref)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Set selection to a single cell (click).
    pub fn click(&mut self, cell_ref: CellRef) {
        self.cells.clear();
        self.cells.insert(cell_ref);
        self.anchor = Some(cell_ref);
    }

    /// Select the rectangle from the anchor to `cell_ref` (shift+click). The
    /// anchor does not move. Without an anchor this is a plain click.
    pub fn shift_click(&mut self, cell_ref: CellRef) {
        let Some(anchor) = self.anchor else {
            self.click(cell_ref);
            return;
        };
        self.cells = CellRange::from_corners(anchor, cell_ref).cells().collect();
    }

    /// Toggle one cell in or out of the selection (ctrl+click).
    pub fn toggle_click(&mut self, cell_ref: CellRef) {
        if !self.cells.remove(&cell_ref) {
            self.cells.insert(cell_ref);
        }
        self.anchor = Some(cell_ref);
    }

    /// Bounding rectangle of the selected cells.
    pub fn bounds(&self) -> Option<CellRange> {
        let first = self.cells.first()?;
        let (mut min_col, mut max_col) = (first.col, first.col);
        let (mut min_row, mut max_row) = (first.row, first.row);
        for cell in &self.cells {
            min_col = min_col.min(cell.col);
            max_col = max_col.max(cell.col);
            min_row = min_row.min(cell.row);
            max_row = max_row.max(cell.row);
        }
        Some(CellRange::from_corners(
            CellRef::new(min_col, min_row),
            CellRef::new(max_col, max_row),
        ))
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.anchor = None;
    }

    /// Drop cells (and the anchor) that fall outside a sheet.
    pub fn prune(&mut self, bounds: GridBounds) {
        self.cells.retain(|cell| bounds.contains(cell));
        if self.anchor.is_some_and(|anchor| !bounds.contains(&anchor)) {
            self.anchor = None;
        }
    }
}
