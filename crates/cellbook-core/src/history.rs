//! Undo/redo history of cell mutations.
//!
//! Records are snapshots: each entry carries the cell before and after the
//! change, so undo writes `previous` back and redo writes `next`.

use cellbook_engine::engine::{Cell, CellRef, GridBounds};

use crate::error::{CellbookError, Result};
use crate::sheet::SheetId;
use crate::table::TableRegion;

/// One cell change on one sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub sheet_id: SheetId,
    pub cell_ref: CellRef,
    pub previous: Option<Cell>,
    pub next: Option<Cell>,
}

/// An undoable user action.
#[derive(Clone, Debug, PartialEq)]
pub enum UndoEntry {
    /// A single cell modification
    Single(HistoryEntry),
    /// Many cells changed by one action (styles, CSV import)
    Batch(Vec<HistoryEntry>),
    /// A table inserted together with its header styling
    Table {
        sheet_id: SheetId,
        table: TableRegion,
        cells: Vec<HistoryEntry>,
    },
}

impl UndoEntry {
    pub fn entries(&self) -> &[HistoryEntry] {
        match self {
            UndoEntry::Single(entry) => std::slice::from_ref(entry),
            UndoEntry::Batch(entries) => entries,
            UndoEntry::Table { cells, .. } => cells,
        }
    }

    /// Keep the changes `keep` accepts. Batches shrink; a table record is
    /// all or nothing.
    fn retain<F>(self, keep: &F) -> Option<UndoEntry>
    where
        F: Fn(SheetId, &CellRef) -> bool,
    {
        match self {
            UndoEntry::Single(entry) => {
                keep(entry.sheet_id, &entry.cell_ref).then_some(UndoEntry::Single(entry))
            }
            UndoEntry::Batch(mut entries) => {
                entries.retain(|entry| keep(entry.sheet_id, &entry.cell_ref));
                if entries.is_empty() {
                    None
                } else {
                    Some(UndoEntry::Batch(entries))
                }
            }
            UndoEntry::Table {
                sheet_id,
                table,
                cells,
            } => {
                let intact = keep(sheet_id, &table.range.start)
                    && keep(sheet_id, &table.range.end)
                    && cells.iter().all(|entry| keep(entry.sheet_id, &entry.cell_ref));
                intact.then_some(UndoEntry::Table {
                    sheet_id,
                    table,
                    cells,
                })
            }
        }
    }
}

/// Linear, capacity-bounded undo/redo stacks.
#[derive(Clone, Debug)]
pub struct History {
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, dropping the oldest records if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.prune();
    }

    /// Record a single change. Clears the redo stack.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.push(UndoEntry::Single(entry));
    }

    /// Record several changes as one undoable action. Empty batches are
    /// ignored.
    pub fn record_batch(&mut self, mut entries: Vec<HistoryEntry>) {
        match entries.len() {
            0 => {}
            1 => self.record(entries.remove(0)),
            _ => self.push(UndoEntry::Batch(entries)),
        }
    }

    /// Record a table insertion and its header restyle as one action.
    pub fn record_table(&mut self, sheet_id: SheetId, table: TableRegion, cells: Vec<HistoryEntry>) {
        self.push(UndoEntry::Table {
            sheet_id,
            table,
            cells,
        });
    }

    fn push(&mut self, entry: UndoEntry) {
        self.undo_stack.push(entry);
        self.redo_stack.clear();
        self.prune();
    }

    fn prune(&mut self) {
        if self.undo_stack.len() > self.capacity {
            let excess = self.undo_stack.len() - self.capacity;
            self.undo_stack.drain(..excess);
            log::debug!("history pruned {} oldest records", excess);
        }
    }

    /// Move the newest record to the redo stack and return it for applying
    /// its `previous` cells.
    pub fn undo(&mut self) -> Result<UndoEntry> {
        let entry = self.undo_stack.pop().ok_or(CellbookError::NothingToUndo)?;
        self.redo_stack.push(entry.clone());
        Ok(entry)
    }

    /// Move the newest undone record back and return it for applying its
    /// `next` cells.
    pub fn redo(&mut self) -> Result<UndoEntry> {
        let entry = self.redo_stack.pop().ok_or(CellbookError::NothingToRedo)?;
        self.undo_stack.push(entry.clone());
        Ok(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Forget every record that touches a sheet.
    pub fn drop_sheet(&mut self, sheet_id: SheetId) {
        let dropped = self.retain(|id, _| id != sheet_id);
        if dropped > 0 {
            log::debug!("history dropped {} records for sheet {}", dropped, sheet_id);
        }
    }

    /// Forget changes on a sheet that fall outside `bounds`, after it shrank.
    pub fn drop_outside(&mut self, sheet_id: SheetId, bounds: GridBounds) {
        let dropped = self.retain(|id, cell_ref| id != sheet_id || bounds.contains(cell_ref));
        if dropped > 0 {
            log::debug!(
                "history dropped {} records outside {}x{} on sheet {}",
                dropped,
                bounds.columns,
                bounds.rows,
                sheet_id
            );
        }
    }

    /// Filter both stacks, returning how many changes were removed.
    fn retain<F>(&mut self, keep: F) -> usize
    where
        F: Fn(SheetId, &CellRef) -> bool,
    {
        let count = |stack: &[UndoEntry]| -> usize { stack.iter().map(|e| e.entries().len()).sum() };
        let before = count(&self.undo_stack) + count(&self.redo_stack);
        self.undo_stack = std::mem::take(&mut self.undo_stack)
            .into_iter()
            .filter_map(|entry| entry.retain(&keep))
            .collect();
        self.redo_stack = std::mem::take(&mut self.redo_stack)
            .into_iter()
            .filter_map(|entry| entry.retain(&keep))
            .collect();
        before - count(&self.undo_stack) - count(&self.redo_stack)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(500)
    }
}
