use super::Document;
use crate::error::{CellbookError, Result};
use crate::history::HistoryEntry;
use crate::storage::{
    parse_csv, parse_csv_records, parse_json, sheet_to_csv, visible_values_to_csv,
    workbook_from_json, workbook_to_json, write_csv, write_json,
};
use cellbook_engine::engine::CellRef;
use std::path::{Path, PathBuf};

impl Document {
    /// Save to current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = self.file_path.clone() else {
            return Err(CellbookError::NoFilePath);
        };
        write_json(&path, &self.workbook)?;
        self.modified = false;
        Ok(path)
    }

    /// Save to a new path and remember it.
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        write_json(path, &self.workbook)?;
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// Load from file. On failure the current workbook is kept.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let workbook = parse_json(path, &self.settings).inspect_err(|e| {
            log::warn!("rejected workbook {}: {}", path.display(), e);
        })?;
        self.replace_workbook(workbook);
        self.file_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Replace the workbook with one parsed from JSON text. On failure the
    /// current workbook is kept.
    pub fn load_json(&mut self, text: &str) -> Result<()> {
        let workbook = workbook_from_json(text, &self.settings).inspect_err(|e| {
            log::warn!("rejected workbook import: {}", e);
        })?;
        self.replace_workbook(workbook);
        Ok(())
    }

    fn replace_workbook(&mut self, workbook: crate::workbook::Workbook) {
        self.workbook = workbook;
        self.selection.clear();
        self.history.clear();
        self.modified = false;
    }

    pub fn to_json(&self) -> Result<String> {
        workbook_to_json(&self.workbook)
    }

    /// Raw input of the active sheet as CSV.
    pub fn export_csv(&self) -> String {
        sheet_to_csv(self.active_sheet())
    }

    /// Computed values of the active sheet's visible rows as CSV.
    pub fn export_visible_csv(&self) -> String {
        visible_values_to_csv(self.active_sheet())
    }

    /// Export the active sheet's raw input to a CSV file.
    pub fn write_csv_file(&self, path: &Path) -> Result<()> {
        write_csv(path, self.active_sheet())
    }

    /// Import CSV text into the active sheet starting at A1, as one undoable
    /// action. Empty fields are skipped. A field that would land outside
    /// the sheet rejects the whole import.
    /// Returns the number of cells imported.
    pub fn import_csv(&mut self, content: &str) -> Result<usize> {
        self.import_records(parse_csv_records(content))
    }

    /// Import a CSV file into the active sheet.
    pub fn import_csv_file(&mut self, path: &Path) -> Result<usize> {
        let records = parse_csv(path)?;
        self.import_records(records)
    }

    fn import_records(&mut self, records: Vec<Vec<String>>) -> Result<usize> {
        let bounds = self.active_sheet().bounds();
        let mut writes = Vec::new();
        for (row, record) in records.into_iter().enumerate() {
            for (col, field) in record.into_iter().enumerate() {
                if field.is_empty() {
                    continue;
                }
                let cell_ref = CellRef::new(col, row);
                if !bounds.contains(&cell_ref) {
                    let err = CellbookError::Parse {
                        line: row + 1,
                        message: format!(
                            "{} is outside the {}x{} sheet",
                            cell_ref, bounds.columns, bounds.rows
                        ),
                    };
                    log::warn!("rejected CSV import: {}", err);
                    return Err(err);
                }
                writes.push((cell_ref, field));
            }
        }
        if writes.is_empty() {
            return Err(CellbookError::EmptyCsv);
        }

        let sheet = self.workbook.active_sheet_mut();
        let sheet_id = sheet.id();
        let mut entries = Vec::with_capacity(writes.len());
        for (cell_ref, field) in writes {
            let (previous, next) = sheet.write(cell_ref, &field)?;
            entries.push(HistoryEntry {
                sheet_id,
                cell_ref,
                previous,
                next,
            });
        }
        let count = entries.len();
        self.commit(entries);
        Ok(count)
    }
}
