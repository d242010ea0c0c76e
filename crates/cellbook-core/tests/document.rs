// Behavioural tests for the Document API: cycles, aggregates, history and
// persistence.

use cellbook_core::{BorderKind, CellRef, CellbookError, Document, Settings, StyleFlag};
use cellbook_engine::engine::{CellError, CellValue};
use pretty_assertions::assert_eq;

fn cell(name: &str) -> CellRef {
    CellRef::from_str(name).unwrap()
}

fn doc_with(entries: &[(&str, &str)]) -> Document {
    let mut doc = Document::new();
    for (name, input) in entries {
        doc.write_named(name, input).unwrap();
    }
    doc
}

fn values(doc: &Document, names: &[&str]) -> Vec<String> {
    names.iter().map(|n| doc.visible_value(&cell(n))).collect()
}

#[test]
fn self_reference_is_a_cycle() {
    let doc = doc_with(&[("A1", "=A1")]);
    assert_eq!(doc.value(&cell("A1")), CellValue::Error(CellError::Cycle));
}

#[test]
fn mutual_references_are_both_cycles() {
    let doc = doc_with(&[("A1", "=B1"), ("B1", "=A1")]);
    assert_eq!(values(&doc, &["A1", "B1"]), vec!["#CYCLE", "#CYCLE"]);
}

#[test]
fn breaking_a_cycle_recovers_values() {
    let mut doc = doc_with(&[("A1", "=B1+1"), ("B1", "=A1")]);
    doc.write(cell("B1"), "4").unwrap();
    assert_eq!(values(&doc, &["A1", "B1"]), vec!["5", "4"]);
    doc.undo().unwrap();
    assert_eq!(values(&doc, &["A1", "B1"]), vec!["#CYCLE", "#CYCLE"]);
}

#[test]
fn sum_skips_text() {
    let doc = doc_with(&[("A1", "1"), ("A2", "x"), ("A3", "3"), ("B1", "=SUM(A1:A3)")]);
    assert_eq!(doc.visible_value(&cell("B1")), "4");
}

#[test]
fn sentinels_propagate_through_arithmetic() {
    let doc = doc_with(&[
        ("A1", "=1/0"),
        ("A2", "=A1+1"),
        ("B1", "=B2"),
        ("B2", "=B1"),
        ("B3", "=B1*2"),
    ]);
    assert_eq!(values(&doc, &["A2", "B3"]), vec!["#ERR", "#CYCLE"]);
}

#[test]
fn formatting_of_results() {
    let doc = doc_with(&[
        ("A1", "=1/3"),
        ("A2", "=0.1+0.2"),
        ("A3", "=10/2"),
        ("A4", "=-2^2"),
        ("A5", "=AVERAGE(A3, 2)"),
    ]);
    assert_eq!(
        values(&doc, &["A1", "A2", "A3", "A4", "A5"]),
        vec!["0.3333333333", "0.3", "5", "-4", "3.5"]
    );
}

#[test]
fn writing_empty_removes_and_undo_restores_exact_cell() {
    let mut doc = doc_with(&[("C3", "=1+1")]);
    doc.click(cell("C3")).unwrap();
    doc.toggle_style(StyleFlag::Underline).unwrap();
    let before = doc.read(&cell("C3")).unwrap();

    doc.write(cell("C3"), "").unwrap();
    assert!(doc.read(&cell("C3")).is_none());

    doc.undo().unwrap();
    assert_eq!(doc.read(&cell("C3")).unwrap(), before);
}

#[test]
fn new_edit_after_undo_discards_redo() {
    let mut doc = doc_with(&[("A1", "1"), ("A1", "2")]);
    doc.undo().unwrap();
    doc.write(cell("B1"), "other").unwrap();
    assert!(matches!(doc.redo(), Err(CellbookError::NothingToRedo)));
    assert_eq!(values(&doc, &["A1", "B1"]), vec!["1", "other"]);
}

#[test]
fn history_capacity_comes_from_settings() {
    let settings = Settings {
        history_capacity: 2,
        ..Settings::default()
    };
    let mut doc = Document::with_settings(settings);
    for n in 1..=4 {
        doc.write(cell("A1"), &n.to_string()).unwrap();
    }
    doc.undo().unwrap();
    doc.undo().unwrap();
    assert!(matches!(doc.undo(), Err(CellbookError::NothingToUndo)));
    assert_eq!(doc.visible_value(&cell("A1")), "2");
}

#[test]
fn json_round_trip_keeps_styles_and_layout() {
    let mut doc = doc_with(&[("A1", "Item"), ("B1", "Cost"), ("B2", "3"), ("B3", "=B2*2")]);
    doc.click(cell("A1")).unwrap();
    doc.shift_click(cell("B3")).unwrap();
    doc.apply_borders(BorderKind::All).unwrap();
    doc.insert_table_named("Purple").unwrap();
    doc.set_column_width(0, 140.0).unwrap();
    doc.set_workbook_name("Expenses");

    let json = doc.to_json().unwrap();
    let mut loaded = Document::new();
    loaded.load_json(&json).unwrap();

    assert_eq!(loaded.workbook().name(), "Expenses");
    assert_eq!(values(&loaded, &["A1", "B3"]), vec!["Item", "6"]);
    for name in ["A1", "B1", "A2", "B3"] {
        assert_eq!(loaded.style(&cell(name)), doc.style(&cell(name)));
    }
    assert_eq!(loaded.active_sheet().tables(), doc.active_sheet().tables());
    assert_eq!(loaded.column_width(0), Some(140.0));
}

#[test]
fn filters_drive_visible_rows() {
    let mut doc = doc_with(&[("A1", "fruit"), ("A2", "veg"), ("A3", "fruit"), ("B3", "=1+1")]);
    doc.set_column_filter(0, ["fruit".to_string()].into()).unwrap();
    assert_eq!(doc.visible_rows(), vec![0, 2]);
    assert_eq!(doc.export_visible_csv(), "fruit,\nfruit,2\n");
    doc.clear_column_filter(0);
    assert_eq!(doc.visible_rows().len(), 40);
}

#[test]
fn undo_and_redo_after_a_shrink_stay_inside_the_sheet() {
    let mut doc = doc_with(&[("E5", "x"), ("E5", ""), ("B2", "inside")]);
    doc.resize(3, 3, |_| panic!("nothing live is outside")).unwrap();

    while doc.undo().is_ok() {}
    while doc.redo().is_ok() {}

    let sheet = doc.active_sheet();
    let bounds = sheet.bounds();
    for cell_ref in sheet.cell_refs() {
        assert!(bounds.contains(&cell_ref), "{} is outside the sheet", cell_ref);
    }
    assert_eq!(doc.visible_value(&cell("B2")), "inside");
}

#[test]
fn long_dependency_chain_loads_and_recalculates() {
    // Every cell reads the next one in row-major order; the last holds 0.
    let (columns, rows) = (5usize, 1000usize);
    let total = columns * rows;
    let mut cells = serde_json::Map::new();
    for index in 0..total {
        let here = CellRef::new(index % columns, index / columns);
        let raw = if index + 1 == total {
            "0".to_string()
        } else {
            let next = CellRef::new((index + 1) % columns, (index + 1) / columns);
            format!("={}+1", next)
        };
        cells.insert(here.to_string(), serde_json::json!({ "rawInput": raw }));
    }
    let payload = serde_json::json!({
        "sheets": [{ "name": "Chain", "columnCount": columns, "rowCount": rows, "cells": cells }]
    });

    let mut doc = Document::new();
    doc.load_json(&payload.to_string()).unwrap();
    assert_eq!(doc.value(&cell("A1")), CellValue::Number((total - 1) as f64));

    doc.write(cell("E1000"), "10").unwrap();
    assert_eq!(doc.value(&cell("A1")), CellValue::Number((total + 9) as f64));
}

#[test]
fn deeply_nested_formula_is_an_error_not_a_crash() {
    let deep = format!("={}1{}", "(".repeat(3000), ")".repeat(3000));
    let doc = doc_with(&[("A1", deep.as_str()), ("B1", "=A1+1"), ("C1", "=((2))*3")]);
    assert_eq!(values(&doc, &["A1", "B1", "C1"]), vec!["#ERR", "#ERR", "6"]);
    assert_eq!(
        doc.evaluate_expression(&format!("{}1", "-".repeat(3000))),
        CellValue::Error(CellError::Err)
    );
}
