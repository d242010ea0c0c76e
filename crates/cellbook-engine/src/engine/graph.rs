//! Precedent/dependent bookkeeping for formula cells.

use std::collections::{BTreeSet, HashMap};

use super::cell::Grid;
use super::cell_ref::{CellRef, GridBounds};
use super::deps::resolve;

/// Which cells each formula reads, and the reverse map.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    precedents: HashMap<CellRef, BTreeSet<CellRef>>,
    dependents: HashMap<CellRef, BTreeSet<CellRef>>,
}

impl DependencyGraph {
    /// Resolve every formula in the grid and record its references.
    pub fn build(grid: &Grid, bounds: GridBounds) -> DependencyGraph {
        let formulas: Vec<(CellRef, String)> = grid
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .formula_body()
                    .map(|body| (*entry.key(), body.to_string()))
            })
            .collect();

        let mut graph = DependencyGraph::default();
        for (cell_ref, body) in formulas {
            let reads = resolve(&body, bounds).cells();
            for precedent in &reads {
                graph
                    .dependents
                    .entry(*precedent)
                    .or_default()
                    .insert(cell_ref);
            }
            graph.precedents.insert(cell_ref, reads);
        }
        graph
    }

    /// Cells a formula reads directly. Empty for non-formula cells.
    pub fn precedents<'a>(
        &'a self,
        cell: &CellRef,
    ) -> impl Iterator<Item = &'a CellRef> + use<'a> {
        self.precedents.get(cell).into_iter().flatten()
    }

    /// Formulas that read `cell` directly.
    pub fn direct_dependents<'a>(
        &'a self,
        cell: &CellRef,
    ) -> impl Iterator<Item = &'a CellRef> + use<'a> {
        self.dependents.get(cell).into_iter().flatten()
    }

    /// Every formula whose value can change when `cell` changes, transitively.
    /// `cell` itself is included only when it sits on a cycle.
    pub fn dependents(&self, cell: &CellRef) -> BTreeSet<CellRef> {
        let mut seen = BTreeSet::new();
        let mut to_process: Vec<CellRef> = self.direct_dependents(cell).copied().collect();
        while let Some(next) = to_process.pop() {
            if !seen.insert(next) {
                continue;
            }
            to_process.extend(self.direct_dependents(&next).copied());
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Cell, new_grid};

    fn grid_with(entries: &[(&str, &str)]) -> Grid {
        let grid = new_grid();
        for (name, input) in entries {
            grid.insert(
                CellRef::from_str(name).unwrap(),
                Cell::from_input(input).unwrap(),
            );
        }
        grid
    }

    fn names(cells: impl IntoIterator<Item = CellRef>) -> Vec<String> {
        cells.into_iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_precedents_and_transitive_dependents() {
        let grid = grid_with(&[
            ("A1", "1"),
            ("B1", "=A1*2"),
            ("C1", "=SUM(A1:B1)"),
            ("D1", "=C1+1"),
            ("E1", "unrelated"),
        ]);
        let graph = DependencyGraph::build(&grid, GridBounds::new(10, 10));

        assert_eq!(
            names(graph.precedents(&CellRef::from_str("C1").unwrap()).copied()),
            vec!["A1", "B1"]
        );
        assert_eq!(
            names(graph.dependents(&CellRef::from_str("A1").unwrap())),
            vec!["B1", "C1", "D1"]
        );
        assert!(graph.dependents(&CellRef::from_str("E1").unwrap()).is_empty());
    }

    #[test]
    fn test_cycle_member_is_its_own_dependent() {
        let grid = grid_with(&[("A1", "=B1"), ("B1", "=A1")]);
        let graph = DependencyGraph::build(&grid, GridBounds::new(10, 10));
        let a1 = CellRef::from_str("A1").unwrap();
        assert!(graph.dependents(&a1).contains(&a1));
    }
}
