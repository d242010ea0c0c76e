//! Reference extraction from formula strings.
//!
//! Scans formula text for everything shaped like a cell reference (`A1`) or
//! a range (`B2:C5`) and classifies it against the sheet bounds. Valid
//! references feed the dependency graph; anything malformed (row 0,
//! lowercase letters, a column or row outside the sheet, a range with a bad
//! end) is handed back as a literal token instead of an error.
//!
//! The formula tokenizer calls [`parse_reference`] too, so evaluation and
//! dependency tracking agree on what counts as a reference.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use super::cell_ref::{CellRange, CellRef, GridBounds};

/// A reference that resolved inside the sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reference {
    Cell(CellRef),
    Range(CellRange),
}

/// Result of scanning a formula body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedRefs {
    pub refs: BTreeSet<CellRef>,
    pub ranges: BTreeSet<CellRange>,
    /// Reference-shaped tokens that did not resolve, in source order.
    pub literals: Vec<String>,
}

impl ResolvedRefs {
    /// Every cell the formula reads: single refs plus expanded range members.
    pub fn cells(&self) -> BTreeSet<CellRef> {
        let mut cells = self.refs.clone();
        for range in &self.ranges {
            cells.extend(range.cells());
        }
        cells
    }
}

/// Classify `A1` or `A1:B2` text. Returns None when malformed or outside `bounds`.
pub fn parse_reference(text: &str, bounds: GridBounds) -> Option<Reference> {
    match text.split_once(':') {
        Some((start, end)) => {
            let start = CellRef::from_str(start).filter(|c| bounds.contains(c))?;
            let end = CellRef::from_str(end).filter(|c| bounds.contains(c))?;
            Some(Reference::Range(CellRange::from_corners(start, end)))
        }
        None => CellRef::from_str(text)
            .filter(|c| bounds.contains(c))
            .map(Reference::Cell),
    }
}

/// Extract all cell and range references from a formula body.
pub fn resolve(expression: &str, bounds: GridBounds) -> ResolvedRefs {
    let mut resolved = ResolvedRefs::default();

    for m in reference_re().find_iter(expression) {
        match parse_reference(m.as_str(), bounds) {
            Some(Reference::Cell(cell)) => {
                resolved.refs.insert(cell);
            }
            Some(Reference::Range(range)) => {
                resolved.ranges.insert(range);
            }
            None => resolved.literals.push(m.as_str().to_string()),
        }
    }

    resolved
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z]+[0-9]+(?::[A-Za-z]+[0-9]+)?\b")
            .expect("dependency reference regex must compile")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> GridBounds {
        GridBounds::new(10, 40)
    }

    fn cell(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    #[test]
    fn test_resolve_refs_and_ranges() {
        let resolved = resolve("SUM(A1:A3, C2) + B7*2", bounds());
        assert_eq!(
            resolved.refs.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
            vec!["C2", "B7"]
        );
        assert_eq!(resolved.ranges.len(), 1);
        let members: Vec<String> = resolved.cells().iter().map(|c| c.to_string()).collect();
        assert_eq!(members, vec!["A1", "A2", "C2", "A3", "B7"]);
        assert!(resolved.literals.is_empty());
    }

    #[test]
    fn test_out_of_bounds_become_literals() {
        // Column K is index 10, outside a 10-column sheet; row 41 is past the end.
        let resolved = resolve("K1 + A41 + A0 + a1 + B2", bounds());
        assert_eq!(resolved.refs, BTreeSet::from([cell("B2")]));
        assert_eq!(resolved.literals, vec!["K1", "A41", "A0", "a1"]);
    }

    #[test]
    fn test_range_with_bad_end_is_literal() {
        let resolved = resolve("SUM(A1:Z9)", bounds());
        assert!(resolved.ranges.is_empty());
        assert_eq!(resolved.literals, vec!["A1:Z9"]);
    }

    #[test]
    fn test_function_names_are_not_references() {
        let resolved = resolve("SUM(1,2) + AVERAGE(3)", bounds());
        assert_eq!(resolved, ResolvedRefs::default());
    }

    #[test]
    fn test_parse_reference_normalizes_range() {
        assert_eq!(
            parse_reference("B3:A1", bounds()),
            Some(Reference::Range(CellRange::from_corners(cell("A1"), cell("B3"))))
        );
        assert_eq!(parse_reference("B3", bounds()), Some(Reference::Cell(cell("B3"))));
        assert_eq!(parse_reference("B3:", bounds()), None);
    }
}
