//! A single sheet: sparse cells plus per-sheet layout state.

use std::collections::{BTreeMap, BTreeSet};

use cellbook_engine::engine::{
    Cell, CellRange, CellRef, CellStyle, Grid, GridBounds, RecalcSummary, new_grid, recalculate,
};

use crate::error::{CellbookError, Result};
use crate::table::TableRegion;

/// Workbook-unique sheet identifier. Never reused.
pub type SheetId = u64;

/// One sheet of a workbook.
#[derive(Debug, Clone)]
pub struct Sheet {
    id: SheetId,
    name: String,
    columns: usize,
    rows: usize,
    /// DashMap keyed by cell; absent cells are empty
    cells: Grid,
    column_widths: BTreeMap<usize, f64>,
    row_heights: BTreeMap<usize, f64>,
    column_filters: BTreeMap<usize, BTreeSet<String>>,
    tables: Vec<TableRegion>,
}

impl Sheet {
    /// Create an empty sheet. Dimensions are raised to at least 1.
    pub fn new(id: SheetId, name: &str, columns: usize, rows: usize) -> Sheet {
        Sheet {
            id,
            name: name.to_string(),
            columns: columns.max(1),
            rows: rows.max(1),
            cells: new_grid(),
            column_widths: BTreeMap::new(),
            row_heights: BTreeMap::new(),
            column_filters: BTreeMap::new(),
            tables: Vec::new(),
        }
    }

    pub fn id(&self) -> SheetId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: SheetId) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.columns, self.rows)
    }

    /// The underlying cell map.
    pub fn cells(&self) -> &Grid {
        &self.cells
    }

    /// Number of stored cells (including style-only cells).
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Stored cell references in row-major order.
    pub fn cell_refs(&self) -> Vec<CellRef> {
        let mut refs: Vec<CellRef> = self.cells.iter().map(|entry| *entry.key()).collect();
        refs.sort();
        refs
    }

    pub fn read(&self, cell_ref: &CellRef) -> Option<Cell> {
        self.cells.get(cell_ref).map(|cell| cell.clone())
    }

    pub fn style(&self, cell_ref: &CellRef) -> Option<CellStyle> {
        self.cells.get(cell_ref).and_then(|cell| cell.style.clone())
    }

    /// Text shown for a cell: the computed value for formulas, the entered
    /// text otherwise, empty for absent cells.
    pub fn visible_value(&self, cell_ref: &CellRef) -> String {
        self.cells
            .get(cell_ref)
            .map(|cell| cell.display())
            .unwrap_or_default()
    }

    pub(crate) fn check_bounds(&self, cell_ref: &CellRef) -> Result<()> {
        if self.bounds().contains(cell_ref) {
            Ok(())
        } else {
            Err(CellbookError::OutOfBounds {
                cell: *cell_ref,
                columns: self.columns,
                rows: self.rows,
            })
        }
    }

    /// Classify `raw_input` and store it, keeping any existing style.
    /// Empty input (after trailing newlines) removes the cell.
    /// Returns the cell that was replaced and the cell now stored.
    pub fn write(
        &mut self,
        cell_ref: CellRef,
        raw_input: &str,
    ) -> Result<(Option<Cell>, Option<Cell>)> {
        self.check_bounds(&cell_ref)?;
        let style = self.style(&cell_ref);
        let new_cell = Cell::from_input(raw_input).map(|cell| cell.with_style(style));
        let old_cell = self.put(cell_ref, new_cell.clone());
        Ok((old_cell, new_cell))
    }

    /// Store (or remove) a cell as-is. Returns the previous cell.
    pub(crate) fn put(&mut self, cell_ref: CellRef, cell: Option<Cell>) -> Option<Cell> {
        match cell {
            Some(cell) => self.cells.insert(cell_ref, cell),
            None => self.cells.remove(&cell_ref).map(|(_, cell)| cell),
        }
    }

    /// Re-evaluate every formula on this sheet.
    pub fn recalculate(&self) -> RecalcSummary {
        recalculate(&self.cells, self.bounds())
    }

    /// Cells that would be dropped by shrinking to the given size.
    pub fn cells_outside(&self, columns: usize, rows: usize) -> Vec<CellRef> {
        let bounds = GridBounds::new(columns, rows);
        let mut outside: Vec<CellRef> = self
            .cells
            .iter()
            .map(|entry| *entry.key())
            .filter(|cell_ref| !bounds.contains(cell_ref))
            .collect();
        outside.sort();
        outside
    }

    /// Change the sheet size, pruning cells, sizes, filters and tables that
    /// fall outside. Returns the removed cells.
    pub fn resize(&mut self, columns: usize, rows: usize) -> Vec<CellRef> {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let removed = self.cells_outside(columns, rows);
        for cell_ref in &removed {
            self.cells.remove(cell_ref);
        }

        self.columns = columns;
        self.rows = rows;
        let bounds = self.bounds();
        self.column_widths.retain(|col, _| *col < columns);
        self.row_heights.retain(|row, _| *row < rows);
        self.column_filters.retain(|col, _| *col < columns);
        self.tables = self
            .tables
            .drain(..)
            .filter_map(|mut table| {
                table.range = table.range.clip(bounds)?;
                Some(table)
            })
            .collect();
        removed
    }

    pub fn column_width(&self, col: usize) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    pub fn row_height(&self, row: usize) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    pub fn column_widths(&self) -> &BTreeMap<usize, f64> {
        &self.column_widths
    }

    pub fn row_heights(&self) -> &BTreeMap<usize, f64> {
        &self.row_heights
    }

    /// Store an already clamped width.
    pub(crate) fn set_column_width(&mut self, col: usize, width: f64) -> Result<()> {
        if col >= self.columns {
            return Err(CellbookError::ColumnOutOfBounds(col));
        }
        self.column_widths.insert(col, width);
        Ok(())
    }

    /// Store an already clamped height.
    pub(crate) fn set_row_height(&mut self, row: usize, height: f64) -> Result<()> {
        if row >= self.rows {
            return Err(CellbookError::RowOutOfBounds(row));
        }
        self.row_heights.insert(row, height);
        Ok(())
    }

    pub fn column_filters(&self) -> &BTreeMap<usize, BTreeSet<String>> {
        &self.column_filters
    }

    pub fn column_filter(&self, col: usize) -> Option<&BTreeSet<String>> {
        self.column_filters.get(&col)
    }

    /// Show only rows whose value in `col` is one of `values`. An empty set
    /// removes the filter.
    pub fn set_column_filter(&mut self, col: usize, values: BTreeSet<String>) -> Result<()> {
        if col >= self.columns {
            return Err(CellbookError::ColumnOutOfBounds(col));
        }
        if values.is_empty() {
            self.column_filters.remove(&col);
        } else {
            self.column_filters.insert(col, values);
        }
        Ok(())
    }

    pub fn clear_column_filter(&mut self, col: usize) {
        self.column_filters.remove(&col);
    }

    /// Distinct visible values of the non-empty cells in a column.
    pub fn distinct_column_values(&self, col: usize) -> BTreeSet<String> {
        self.cells
            .iter()
            .filter(|entry| entry.key().col == col)
            .map(|entry| entry.value().display())
            .filter(|value| !value.is_empty())
            .collect()
    }

    pub fn is_row_visible(&self, row: usize) -> bool {
        self.column_filters.iter().all(|(col, allowed)| {
            allowed.contains(&self.visible_value(&CellRef::new(*col, row)))
        })
    }

    /// Row indexes that pass every column filter.
    pub fn visible_rows(&self) -> Vec<usize> {
        (0..self.rows).filter(|row| self.is_row_visible(*row)).collect()
    }

    pub fn tables(&self) -> &[TableRegion] {
        &self.tables
    }

    /// Add a table region and return its id.
    pub(crate) fn add_table(
        &mut self,
        range: CellRange,
        header_color: &str,
        body_color: &str,
    ) -> &TableRegion {
        let id = self.tables.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.tables.push(TableRegion {
            id,
            range,
            header_color: header_color.to_string(),
            body_color: body_color.to_string(),
            zebra: true,
        });
        &self.tables[self.tables.len() - 1]
    }

    pub(crate) fn push_table(&mut self, table: TableRegion) {
        self.tables.push(table);
    }

    pub(crate) fn remove_table(&mut self, id: u64) -> Option<TableRegion> {
        let index = self.tables.iter().position(|t| t.id == id)?;
        Some(self.tables.remove(index))
    }

    pub(crate) fn set_column_widths(&mut self, widths: BTreeMap<usize, f64>) {
        self.column_widths = widths;
    }

    pub(crate) fn set_row_heights(&mut self, heights: BTreeMap<usize, f64>) {
        self.row_heights = heights;
    }

    /// Smallest rectangle from A1 covering every cell with content, or None
    /// for a sheet without content.
    pub fn used_range(&self) -> Option<CellRange> {
        let mut max: Option<(usize, usize)> = None;
        for entry in self.cells.iter() {
            if entry.value().raw_input.is_empty() {
                continue;
            }
            let cell_ref = entry.key();
            let (col, row) = max.unwrap_or((0, 0));
            max = Some((col.max(cell_ref.col), row.max(cell_ref.row)));
        }
        max.map(|(col, row)| CellRange::from_corners(CellRef::new(0, 0), CellRef::new(col, row)))
    }
}
