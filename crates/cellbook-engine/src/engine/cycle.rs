//! Circular dependency detection for formula cells.
//!
//! Recalculation already turns cycles into `#CYCLE` values; this module
//! answers the follow-up question "which cells form the loop?" so a caller
//! can point the user at it. It runs a depth-first search over the
//! [`DependencyGraph`] with an explicit stack.

use std::collections::HashSet;

use super::cell_ref::CellRef;
use super::graph::DependencyGraph;

/// A cell whose precedents are being explored.
struct Frame {
    cell: CellRef,
    precedents: std::vec::IntoIter<CellRef>,
}

impl Frame {
    fn new(cell: CellRef, graph: &DependencyGraph) -> Frame {
        let precedents: Vec<CellRef> = graph.precedents(&cell).copied().collect();
        Frame {
            cell,
            precedents: precedents.into_iter(),
        }
    }
}

/// Detect circular dependencies starting from a cell.
/// Returns Some(cycle_path) if a cycle is reachable, None otherwise. The path
/// ends with the cell that closes the loop.
pub fn detect_cycle(start: &CellRef, graph: &DependencyGraph) -> Option<Vec<CellRef>> {
    let mut visiting = HashSet::new();
    let mut done = HashSet::new();
    let mut stack = vec![Frame::new(*start, graph)];
    visiting.insert(*start);

    while let Some(frame) = stack.last_mut() {
        match frame.precedents.next() {
            Some(dep) => {
                if visiting.contains(&dep) {
                    let mut path: Vec<CellRef> = stack.iter().map(|f| f.cell).collect();
                    path.push(dep);
                    return Some(path);
                }
                if done.contains(&dep) {
                    continue;
                }
                visiting.insert(dep);
                stack.push(Frame::new(dep, graph));
            }
            None => {
                let cell = frame.cell;
                stack.pop();
                visiting.remove(&cell);
                done.insert(cell);
            }
        }
    }
    None
}
