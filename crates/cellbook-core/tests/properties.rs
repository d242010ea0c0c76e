// Property-based tests for recalculation, selection and history.
// Soak: PROPTEST_CASES=10000 cargo test -p cellbook-core --release

use cellbook_core::{CellRef, Document};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// A cell inside a 4x4 corner of the default sheet.
fn arb_cell() -> impl Strategy<Value = CellRef> {
    (0usize..4, 0usize..4).prop_map(|(col, row)| CellRef::new(col, row))
}

fn arb_name() -> impl Strategy<Value = String> {
    arb_cell().prop_map(|c| c.to_string())
}

/// Numbers, text, empty input and formulas over the 4x4 corner, including
/// references that may form cycles.
fn arb_input() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => (-1000i32..1000).prop_map(|n| n.to_string()),
        1 => "[a-z]{1,6}",
        1 => Just(String::new()),
        2 => (arb_name(), arb_name()).prop_map(|(a, b)| format!("={}+{}", a, b)),
        2 => (arb_name(), arb_name()).prop_map(|(a, b)| format!("=SUM({}:{})", a, b)),
        1 => (arb_name(), arb_name()).prop_map(|(a, b)| format!("={}/{}", a, b)),
    ]
}

fn arb_edits(max: usize) -> impl Strategy<Value = Vec<(CellRef, String)>> {
    prop::collection::vec((arb_cell(), arb_input()), 1..max)
}

fn snapshot(doc: &Document) -> Vec<(String, String, String)> {
    let sheet = doc.active_sheet();
    sheet
        .cell_refs()
        .into_iter()
        .map(|c| {
            let cell = sheet.read(&c).unwrap();
            (c.to_string(), cell.raw_input.clone(), cell.display())
        })
        .collect()
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn recalculation_is_idempotent(edits in arb_edits(24)) {
        let mut doc = Document::new();
        for (cell, input) in &edits {
            doc.write(*cell, input).unwrap();
        }
        let first = snapshot(&doc);
        let summary = doc.recalculate();
        let second = snapshot(&doc);
        prop_assert_eq!(first, second);
        let again = doc.recalculate();
        prop_assert_eq!(summary, again);
    }

    #[test]
    fn shift_click_selects_the_rectangle_in_any_order(a in arb_cell(), b in arb_cell()) {
        let mut forward = Document::new();
        forward.click(a).unwrap();
        forward.shift_click(b).unwrap();

        let mut backward = Document::new();
        backward.click(b).unwrap();
        backward.shift_click(a).unwrap();

        let width = a.col.abs_diff(b.col) + 1;
        let height = a.row.abs_diff(b.row) + 1;
        prop_assert_eq!(forward.selection().len(), width * height);
        let f: Vec<CellRef> = forward.selection().cells().copied().collect();
        let g: Vec<CellRef> = backward.selection().cells().copied().collect();
        prop_assert_eq!(f, g);
        prop_assert_eq!(forward.selection().bounds(), backward.selection().bounds());
    }

    #[test]
    fn undo_all_then_redo_all_restores_final_state(edits in arb_edits(16)) {
        let mut doc = Document::new();
        let initial = snapshot(&doc);
        for (cell, input) in &edits {
            doc.write(*cell, input).unwrap();
        }
        let last = snapshot(&doc);

        while doc.history().can_undo() {
            doc.undo().unwrap();
        }
        prop_assert_eq!(snapshot(&doc), initial);

        while doc.history().can_redo() {
            doc.redo().unwrap();
        }
        prop_assert_eq!(snapshot(&doc), last);
    }

    #[test]
    fn json_round_trip_preserves_values(edits in arb_edits(16)) {
        let mut doc = Document::new();
        for (cell, input) in &edits {
            doc.write(*cell, input).unwrap();
        }
        let json = doc.to_json().unwrap();
        let mut loaded = Document::new();
        loaded.load_json(&json).unwrap();
        prop_assert_eq!(snapshot(&doc), snapshot(&loaded));
    }
}
