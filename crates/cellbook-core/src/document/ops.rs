use super::Document;
use crate::error::{CellbookError, Result};
use crate::history::{HistoryEntry, UndoEntry};
use crate::sheet::{Sheet, SheetId};
use cellbook_engine::engine::{
    Cell, CellError, CellRef, CellStyle, CellValue, DependencyGraph, RecalcSummary, detect_cycle,
    evaluate_formula,
};
use std::collections::BTreeSet;

impl Document {
    pub fn active_sheet(&self) -> &Sheet {
        self.workbook.active_sheet()
    }

    /// Record the changes as one undoable action and bring the active sheet
    /// up to date.
    pub(crate) fn commit(&mut self, entries: Vec<HistoryEntry>) {
        if entries.is_empty() {
            return;
        }
        self.history.record_batch(entries);
        self.workbook.active_sheet().recalculate();
        self.modified = true;
    }

    /// Re-evaluate every formula on the active sheet.
    pub fn recalculate(&self) -> RecalcSummary {
        self.workbook.active_sheet().recalculate()
    }

    pub fn read(&self, cell_ref: &CellRef) -> Option<Cell> {
        self.active_sheet().read(cell_ref)
    }

    pub fn value(&self, cell_ref: &CellRef) -> CellValue {
        self.active_sheet()
            .read(cell_ref)
            .map(|cell| cell.value)
            .unwrap_or(CellValue::Empty)
    }

    pub fn visible_value(&self, cell_ref: &CellRef) -> String {
        self.active_sheet().visible_value(cell_ref)
    }

    pub fn style(&self, cell_ref: &CellRef) -> Option<CellStyle> {
        self.active_sheet().style(cell_ref)
    }

    /// Set cell contents from input string on the active sheet.
    pub fn write(&mut self, cell_ref: CellRef, raw_input: &str) -> Result<()> {
        let sheet = self.workbook.active_sheet_mut();
        let sheet_id = sheet.id();
        let (previous, next) = sheet.write(cell_ref, raw_input)?;
        if previous.is_none() && next.is_none() {
            return Ok(());
        }
        self.commit(vec![HistoryEntry {
            sheet_id,
            cell_ref,
            previous,
            next,
        }]);
        Ok(())
    }

    /// Like [`Document::write`], addressing the cell by name ("B7", "b7").
    pub fn write_named(&mut self, name: &str, raw_input: &str) -> Result<()> {
        let cell_ref = parse_cell_name(name)?;
        self.write(cell_ref, raw_input)
    }

    /// Remove a cell's content but keep its style.
    pub fn clear_content(&mut self, cell_ref: CellRef) -> Result<()> {
        let sheet = self.workbook.active_sheet_mut();
        sheet.check_bounds(&cell_ref)?;
        let Some(previous) = sheet.read(&cell_ref) else {
            return Ok(());
        };
        let next = previous.style.clone().map(Cell::style_only);
        if next.as_ref() == Some(&previous) {
            return Ok(());
        }
        let sheet_id = sheet.id();
        sheet.put(cell_ref, next.clone());
        self.commit(vec![HistoryEntry {
            sheet_id,
            cell_ref,
            previous: Some(previous),
            next,
        }]);
        Ok(())
    }

    /// Resize the active sheet. When cells would be dropped, `confirm` is
    /// shown them first and may cancel the resize. A resize that drops cells
    /// also drops this sheet's history; any other shrink drops the records
    /// that point past the new edge.
    pub fn resize<F>(&mut self, columns: usize, rows: usize, confirm: F) -> Result<Vec<CellRef>>
    where
        F: FnOnce(&[CellRef]) -> bool,
    {
        if !self.settings.dimensions_allowed(columns, rows) {
            return Err(CellbookError::InvalidDimensions {
                columns,
                rows,
                max_columns: self.settings.max_columns,
                max_rows: self.settings.max_rows,
            });
        }

        let sheet = self.workbook.active_sheet_mut();
        let doomed = sheet.cells_outside(columns, rows);
        if !doomed.is_empty() && !confirm(&doomed) {
            log::warn!(
                "resize of '{}' to {}x{} declined ({} cells would be removed)",
                sheet.name(),
                columns,
                rows,
                doomed.len()
            );
            return Err(CellbookError::ResizeDeclined);
        }

        let removed = sheet.resize(columns, rows);
        let sheet_id = sheet.id();
        let bounds = sheet.bounds();
        if !removed.is_empty() {
            self.history.drop_sheet(sheet_id);
        } else {
            self.history.drop_outside(sheet_id, bounds);
        }
        self.selection.prune(bounds);
        self.workbook.active_sheet().recalculate();
        self.modified = true;
        Ok(removed)
    }

    /// Undo the last action
    pub fn undo(&mut self) -> Result<()> {
        let entry = self.history.undo()?;
        self.apply_history(&entry, false);
        Ok(())
    }

    /// Redo the last undone action
    pub fn redo(&mut self) -> Result<()> {
        let entry = self.history.redo()?;
        self.apply_history(&entry, true);
        Ok(())
    }

    /// Write the `next` (redo) or `previous` (undo) side of a record back and
    /// recalculate every sheet it touched.
    fn apply_history(&mut self, entry: &UndoEntry, forward: bool) {
        let mut touched: Vec<SheetId> = Vec::new();
        let entries = entry.entries();
        let ordered: Box<dyn Iterator<Item = &HistoryEntry>> = if forward {
            Box::new(entries.iter())
        } else {
            Box::new(entries.iter().rev())
        };

        for change in ordered {
            let state = if forward {
                change.next.clone()
            } else {
                change.previous.clone()
            };
            let Some(sheet) = self.workbook.sheet_by_id_mut(change.sheet_id) else {
                log::warn!("history record for missing sheet {}", change.sheet_id);
                continue;
            };
            if !sheet.bounds().contains(&change.cell_ref) {
                log::warn!(
                    "history record for {} outside sheet '{}' skipped",
                    change.cell_ref,
                    sheet.name()
                );
                continue;
            }
            sheet.put(change.cell_ref, state);
            if !touched.contains(&change.sheet_id) {
                touched.push(change.sheet_id);
            }
        }

        if let UndoEntry::Table {
            sheet_id, table, ..
        } = entry
            && let Some(sheet) = self.workbook.sheet_by_id_mut(*sheet_id)
        {
            if forward {
                sheet.push_table(table.clone());
            } else {
                sheet.remove_table(table.id);
            }
        }

        for sheet_id in touched {
            if let Some(sheet) = self.workbook.sheet_by_id_mut(sheet_id) {
                sheet.recalculate();
            }
        }
        self.modified = true;
    }

    /// Select a single cell.
    pub fn click(&mut self, cell_ref: CellRef) -> Result<()> {
        self.active_sheet().check_bounds(&cell_ref)?;
        self.selection.click(cell_ref);
        Ok(())
    }

    /// Select the rectangle from the anchor to `cell_ref`.
    pub fn shift_click(&mut self, cell_ref: CellRef) -> Result<()> {
        self.active_sheet().check_bounds(&cell_ref)?;
        self.selection.shift_click(cell_ref);
        Ok(())
    }

    /// Toggle one cell in or out of the selection.
    pub fn toggle_click(&mut self, cell_ref: CellRef) -> Result<()> {
        self.active_sheet().check_bounds(&cell_ref)?;
        self.selection.toggle_click(cell_ref);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_workbook_name(&mut self, name: &str) {
        self.workbook.set_name(name);
        self.modified = true;
    }

    /// Append a sheet of the default size and switch to it.
    pub fn add_sheet(&mut self, name: Option<&str>) -> Result<usize> {
        let index = self.workbook.add_sheet(
            name,
            self.settings.default_columns,
            self.settings.default_rows,
        )?;
        self.selection.clear();
        self.modified = true;
        Ok(index)
    }

    pub fn rename_sheet(&mut self, index: usize, name: &str) -> Result<()> {
        self.workbook.rename_sheet(index, name)?;
        self.modified = true;
        Ok(())
    }

    /// Delete a sheet together with its history.
    pub fn delete_sheet(&mut self, index: usize) -> Result<()> {
        let previous_active = self.workbook.active_index();
        let removed = self.workbook.delete_sheet(index)?;
        self.history.drop_sheet(removed.id());
        if index == previous_active {
            self.selection.clear();
        }
        self.modified = true;
        Ok(())
    }

    pub fn duplicate_sheet(&mut self, index: usize) -> Result<usize> {
        let copy = self.workbook.duplicate_sheet(index)?;
        self.modified = true;
        Ok(copy)
    }

    /// Switch the active sheet. The selection is cleared.
    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        self.workbook.set_active_sheet(index)?;
        self.selection.clear();
        Ok(())
    }

    pub fn set_active_sheet_by_name(&mut self, name: &str) -> Result<()> {
        let index = self
            .workbook
            .find_sheet(name)
            .ok_or_else(|| CellbookError::UnknownSheet(name.to_string()))?;
        self.set_active_sheet(index)
    }

    /// Set a column width, clamped to the configured limits. Returns the
    /// stored width.
    pub fn set_column_width(&mut self, col: usize, width: f64) -> Result<f64> {
        let width = self.settings.clamp_column_width(width);
        self.workbook.active_sheet_mut().set_column_width(col, width)?;
        self.modified = true;
        Ok(width)
    }

    /// Set a row height, clamped to the configured limits. Returns the
    /// stored height.
    pub fn set_row_height(&mut self, row: usize, height: f64) -> Result<f64> {
        let height = self.settings.clamp_row_height(height);
        self.workbook.active_sheet_mut().set_row_height(row, height)?;
        self.modified = true;
        Ok(height)
    }

    pub fn column_width(&self, col: usize) -> Option<f64> {
        self.active_sheet().column_width(col)
    }

    pub fn row_height(&self, row: usize) -> Option<f64> {
        self.active_sheet().row_height(row)
    }

    pub fn set_column_filter(&mut self, col: usize, values: BTreeSet<String>) -> Result<()> {
        self.workbook.active_sheet_mut().set_column_filter(col, values)?;
        self.modified = true;
        Ok(())
    }

    pub fn clear_column_filter(&mut self, col: usize) {
        self.workbook.active_sheet_mut().clear_column_filter(col);
        self.modified = true;
    }

    pub fn distinct_column_values(&self, col: usize) -> BTreeSet<String> {
        self.active_sheet().distinct_column_values(col)
    }

    pub fn is_row_visible(&self, row: usize) -> bool {
        self.active_sheet().is_row_visible(row)
    }

    pub fn visible_rows(&self) -> Vec<usize> {
        self.active_sheet().visible_rows()
    }

    /// Evaluate an expression against the active sheet without storing it.
    pub fn evaluate_expression(&self, formula: &str) -> CellValue {
        let sheet = self.active_sheet();
        evaluate_formula(formula, sheet.cells(), sheet.bounds())
    }

    fn dependency_graph(&self) -> DependencyGraph {
        let sheet = self.active_sheet();
        DependencyGraph::build(sheet.cells(), sheet.bounds())
    }

    /// Cells the formula at `cell_ref` reads directly.
    pub fn precedents(&self, cell_ref: &CellRef) -> Vec<CellRef> {
        self.dependency_graph()
            .precedents(cell_ref)
            .copied()
            .collect()
    }

    /// Formulas affected (transitively) by a change to `cell_ref`.
    pub fn dependents(&self, cell_ref: &CellRef) -> Vec<CellRef> {
        self.dependency_graph()
            .dependents(cell_ref)
            .into_iter()
            .collect()
    }

    /// The reference loop reachable from `cell_ref`, if any.
    pub fn cycle_path(&self, cell_ref: &CellRef) -> Option<Vec<CellRef>> {
        detect_cycle(cell_ref, &self.dependency_graph())
    }

    /// Names of the sheets holding at least one `#CYCLE` value.
    pub fn sheets_with_cycles(&self) -> Vec<String> {
        self.workbook
            .sheets()
            .iter()
            .filter(|sheet| {
                sheet
                    .cells()
                    .iter()
                    .any(|entry| entry.value().value == CellValue::Error(CellError::Cycle))
            })
            .map(|sheet| sheet.name().to_string())
            .collect()
    }
}

/// Parse "B7" (any case) into a cell reference.
pub(crate) fn parse_cell_name(name: &str) -> Result<CellRef> {
    CellRef::from_str(&name.trim().to_ascii_uppercase())
        .ok_or_else(|| CellbookError::InvalidReference(name.to_string()))
}
