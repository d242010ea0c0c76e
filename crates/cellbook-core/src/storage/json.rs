//! Workbook persistence as JSON.
//!
//! Only raw input and style are stored per cell; values are re-derived by a
//! recalculation after loading. Loading validates the whole payload before
//! building anything, so a bad file never yields a half-loaded workbook.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use cellbook_engine::engine::{Cell, CellRange, CellRef, CellStyle};
use serde::{Deserialize, Serialize};

use crate::error::{CellbookError, Result};
use crate::settings::Settings;
use crate::sheet::Sheet;
use crate::table::TableRegion;
use crate::workbook::{DEFAULT_WORKBOOK_NAME, Workbook};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkbookFile {
    #[serde(default = "default_workbook_name")]
    name: String,
    sheets: Vec<SheetFile>,
    #[serde(default)]
    active_sheet_index: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetFile {
    name: String,
    column_count: usize,
    row_count: usize,
    #[serde(default)]
    cells: BTreeMap<String, CellFile>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    column_widths: BTreeMap<usize, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    row_heights: BTreeMap<usize, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    column_filters: BTreeMap<usize, BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tables: Vec<TableFile>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellFile {
    #[serde(default)]
    raw_input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<CellStyle>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableFile {
    id: u64,
    range: String,
    header_color: String,
    body_color: String,
    #[serde(default)]
    zebra: bool,
}

fn default_workbook_name() -> String {
    DEFAULT_WORKBOOK_NAME.to_string()
}

fn invalid(message: String) -> CellbookError {
    CellbookError::InvalidWorkbook(message)
}

/// Serialize a workbook (pretty-printed).
pub fn workbook_to_json(workbook: &Workbook) -> Result<String> {
    let file = WorkbookFile {
        name: workbook.name().to_string(),
        sheets: workbook.sheets().iter().map(sheet_to_file).collect(),
        active_sheet_index: workbook.active_index(),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

fn sheet_to_file(sheet: &Sheet) -> SheetFile {
    let cells = sheet
        .cell_refs()
        .into_iter()
        .filter_map(|cell_ref| {
            let cell = sheet.read(&cell_ref)?;
            Some((
                cell_ref.to_string(),
                CellFile {
                    raw_input: cell.raw_input,
                    style: cell.style,
                },
            ))
        })
        .collect();
    SheetFile {
        name: sheet.name().to_string(),
        column_count: sheet.columns(),
        row_count: sheet.rows(),
        cells,
        column_widths: sheet.column_widths().clone(),
        row_heights: sheet.row_heights().clone(),
        column_filters: sheet.column_filters().clone(),
        tables: sheet
            .tables()
            .iter()
            .map(|table| TableFile {
                id: table.id,
                range: table.range.to_string(),
                header_color: table.header_color.clone(),
                body_color: table.body_color.clone(),
                zebra: table.zebra,
            })
            .collect(),
    }
}

/// Parse and validate a workbook, then recalculate every sheet.
pub fn workbook_from_json(text: &str, settings: &Settings) -> Result<Workbook> {
    let file: WorkbookFile = serde_json::from_str(text)?;
    if file.sheets.is_empty() {
        return Err(invalid("workbook has no sheets".into()));
    }

    let mut sheets = Vec::with_capacity(file.sheets.len());
    for (index, sheet_file) in file.sheets.into_iter().enumerate() {
        sheets.push(sheet_from_file(index, sheet_file, settings)?);
    }
    let workbook = Workbook::from_sheets(&file.name, sheets, file.active_sheet_index)?;
    for sheet in workbook.sheets() {
        sheet.recalculate();
    }
    Ok(workbook)
}

fn sheet_from_file(index: usize, file: SheetFile, settings: &Settings) -> Result<Sheet> {
    let (columns, rows) = (file.column_count, file.row_count);
    if !settings.dimensions_allowed(columns, rows) {
        return Err(invalid(format!(
            "sheet '{}' has invalid size {}x{}",
            file.name, columns, rows
        )));
    }

    let mut sheet = Sheet::new(index as u64 + 1, &file.name, columns, rows);
    let bounds = sheet.bounds();
    for (id, cell_file) in file.cells {
        let cell_ref = CellRef::from_str(&id)
            .filter(|cell_ref| bounds.contains(cell_ref))
            .ok_or_else(|| invalid(format!("sheet '{}' has invalid cell id '{}'", file.name, id)))?;
        let cell = match Cell::from_input(&cell_file.raw_input) {
            Some(cell) => Some(cell.with_style(cell_file.style)),
            None => cell_file.style.map(Cell::style_only),
        };
        sheet.put(cell_ref, cell);
    }

    for (col, width) in file.column_widths {
        sheet
            .set_column_width(col, settings.clamp_column_width(width))
            .map_err(|e| invalid(format!("sheet '{}': {}", file.name, e)))?;
    }
    for (row, height) in file.row_heights {
        sheet
            .set_row_height(row, settings.clamp_row_height(height))
            .map_err(|e| invalid(format!("sheet '{}': {}", file.name, e)))?;
    }
    for (col, values) in file.column_filters {
        sheet
            .set_column_filter(col, values)
            .map_err(|e| invalid(format!("sheet '{}': {}", file.name, e)))?;
    }
    for table in file.tables {
        let range = parse_range(&table.range)
            .filter(|range| bounds.contains(&range.end))
            .ok_or_else(|| {
                invalid(format!(
                    "sheet '{}' has invalid table range '{}'",
                    file.name, table.range
                ))
            })?;
        sheet.push_table(TableRegion {
            id: table.id,
            range,
            header_color: table.header_color,
            body_color: table.body_color,
            zebra: table.zebra,
        });
    }
    Ok(sheet)
}

fn parse_range(text: &str) -> Option<CellRange> {
    let (start, end) = text.split_once(':')?;
    Some(CellRange::from_corners(
        CellRef::from_str(start)?,
        CellRef::from_str(end)?,
    ))
}

/// Save a workbook to a JSON file.
pub fn write_json(path: &Path, workbook: &Workbook) -> Result<()> {
    std::fs::write(path, workbook_to_json(workbook)?)?;
    Ok(())
}

/// Load a workbook from a JSON file.
pub fn parse_json(path: &Path, settings: &Settings) -> Result<Workbook> {
    let content = std::fs::read_to_string(path)?;
    workbook_from_json(&content, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellbook_engine::engine::CellValue;

    const SAMPLE: &str = r##"{
        "name": "Budget",
        "sheets": [
            {
                "name": "Q1",
                "columnCount": 4,
                "rowCount": 5,
                "cells": {
                    "A1": { "rawInput": "10" },
                    "A2": { "rawInput": "=A1*2", "style": { "bold": true, "align": "right" } },
                    "B1": { "rawInput": "", "style": { "fill": "#ff0000" } }
                },
                "columnWidths": { "0": 120 },
                "columnFilters": { "1": ["x"] },
                "tables": [
                    { "id": 3, "range": "A1:B3", "headerColor": "#4472c4", "bodyColor": "#d0e2ff", "zebra": true }
                ]
            },
            { "name": "Q2", "columnCount": 2, "rowCount": 2 }
        ],
        "activeSheetIndex": 1
    }"##;

    #[test]
    fn test_load_sample() {
        let wb = workbook_from_json(SAMPLE, &Settings::default()).unwrap();
        assert_eq!(wb.name(), "Budget");
        assert_eq!(wb.active_index(), 1);

        let q1 = wb.sheet(0).unwrap();
        let a2 = q1.read(&CellRef::new(0, 1)).unwrap();
        assert_eq!(a2.value, CellValue::Number(20.0));
        assert!(a2.style.unwrap().bold);
        let b1 = q1.read(&CellRef::new(1, 0)).unwrap();
        assert_eq!(b1.raw_input, "");
        assert_eq!(b1.style.unwrap().fill.as_deref(), Some("#ff0000"));
        assert_eq!(q1.column_width(0), Some(120.0));
        assert_eq!(q1.tables()[0].range.to_string(), "A1:B3");
        assert!(q1.column_filter(1).unwrap().contains("x"));
    }

    #[test]
    fn test_round_trip_preserves_values_and_styles() {
        let wb = workbook_from_json(SAMPLE, &Settings::default()).unwrap();
        let text = workbook_to_json(&wb).unwrap();
        let again = workbook_from_json(&text, &Settings::default()).unwrap();

        let (a, b) = (wb.sheet(0).unwrap(), again.sheet(0).unwrap());
        assert_eq!(a.cell_refs(), b.cell_refs());
        for cell_ref in a.cell_refs() {
            assert_eq!(a.read(&cell_ref), b.read(&cell_ref));
        }
        assert_eq!(a.tables(), b.tables());
        assert_eq!(again.active_index(), 1);
    }

    #[test]
    fn test_malformed_payloads_are_rejected() {
        let settings = Settings::default();
        let cases = [
            "not json",
            r#"{"name": "x"}"#,
            r#"{"sheets": {}}"#,
            r#"{"sheets": []}"#,
            r#"{"sheets": [{"name": "a", "columnCount": 0, "rowCount": 5}]}"#,
            r#"{"sheets": [{"name": "a", "columnCount": 2, "rowCount": 2, "cells": {"C1": {"rawInput": "1"}}}]}"#,
            r#"{"sheets": [{"name": "a", "columnCount": 2, "rowCount": 2, "cells": {"a1": {"rawInput": "1"}}}]}"#,
            r#"{"sheets": [{"name": "a", "columnCount": 2, "rowCount": 2}], "activeSheetIndex": 1}"#,
            r#"{"sheets": [{"name": "a", "columnCount": 2, "rowCount": 2, "tables": [{"id": 1, "range": "A1:C1", "headerColor": "", "bodyColor": ""}]}]}"#,
        ];
        for case in cases {
            assert!(
                workbook_from_json(case, &settings).is_err(),
                "accepted: {}",
                case
            );
        }
    }
}
