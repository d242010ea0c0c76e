//! The workbook: an ordered, never-empty list of sheets.

use crate::error::{CellbookError, Result};
use crate::sheet::{Sheet, SheetId};

pub const DEFAULT_WORKBOOK_NAME: &str = "Workbook";

#[derive(Debug, Clone)]
pub struct Workbook {
    name: String,
    sheets: Vec<Sheet>,
    active: usize,
    next_sheet_id: SheetId,
}

impl Workbook {
    /// A workbook with one empty sheet named "Sheet1".
    pub fn new(columns: usize, rows: usize) -> Workbook {
        Workbook {
            name: DEFAULT_WORKBOOK_NAME.to_string(),
            sheets: vec![Sheet::new(1, "Sheet1", columns, rows)],
            active: 0,
            next_sheet_id: 2,
        }
    }

    /// Assemble a workbook from loaded sheets. Sheet ids are reassigned.
    pub fn from_sheets(name: &str, mut sheets: Vec<Sheet>, active: usize) -> Result<Workbook> {
        if sheets.is_empty() {
            return Err(CellbookError::InvalidWorkbook("no sheets".into()));
        }
        if active >= sheets.len() {
            return Err(CellbookError::InvalidWorkbook(format!(
                "active sheet index {} out of range",
                active
            )));
        }
        for (index, sheet) in sheets.iter_mut().enumerate() {
            sheet.set_id(index as SheetId + 1);
        }
        let next_sheet_id = sheets.len() as SheetId + 1;
        Ok(Workbook {
            name: name.to_string(),
            sheets,
            active,
            next_sheet_id,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet(&self, index: usize) -> Result<&Sheet> {
        self.sheets.get(index).ok_or(CellbookError::SheetIndex(index))
    }

    pub fn sheet_mut(&mut self, index: usize) -> Result<&mut Sheet> {
        self.sheets
            .get_mut(index)
            .ok_or(CellbookError::SheetIndex(index))
    }

    pub fn sheet_by_id_mut(&mut self, id: SheetId) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|sheet| sheet.id() == id)
    }

    /// Index of the first sheet with this name.
    pub fn find_sheet(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|sheet| sheet.name() == name)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_sheet(&self) -> &Sheet {
        &self.sheets[self.active]
    }

    pub fn active_sheet_mut(&mut self) -> &mut Sheet {
        &mut self.sheets[self.active]
    }

    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        self.sheet(index)?;
        self.active = index;
        Ok(())
    }

    fn allocate_id(&mut self) -> SheetId {
        let id = self.next_sheet_id;
        self.next_sheet_id += 1;
        id
    }

    /// Append a new empty sheet and make it active. Without a name the
    /// sheet is called "Sheet<N>". Returns its index.
    pub fn add_sheet(&mut self, name: Option<&str>, columns: usize, rows: usize) -> Result<usize> {
        let name = match name {
            Some(name) if name.trim().is_empty() => return Err(CellbookError::EmptyName),
            Some(name) => name.to_string(),
            None => format!("Sheet{}", self.sheets.len() + 1),
        };
        let id = self.allocate_id();
        self.sheets.push(Sheet::new(id, &name, columns, rows));
        self.active = self.sheets.len() - 1;
        Ok(self.active)
    }

    pub fn rename_sheet(&mut self, index: usize, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(CellbookError::EmptyName);
        }
        self.sheet_mut(index)?.set_name(name);
        Ok(())
    }

    /// Remove a sheet. The last remaining sheet cannot be deleted. When the
    /// active sheet moves, it steps back by one.
    pub fn delete_sheet(&mut self, index: usize) -> Result<Sheet> {
        self.sheet(index)?;
        if self.sheets.len() == 1 {
            return Err(CellbookError::LastSheet);
        }
        let removed = self.sheets.remove(index);
        if index <= self.active {
            self.active = self.active.saturating_sub(1);
        }
        Ok(removed)
    }

    /// Deep-copy a sheet under a fresh id, inserted right after the
    /// original. Returns the copy's index.
    pub fn duplicate_sheet(&mut self, index: usize) -> Result<usize> {
        let mut copy = self.sheet(index)?.clone();
        let id = self.allocate_id();
        copy.set_id(id);
        let name = format!("{} (copy)", copy.name());
        copy.set_name(&name);
        self.sheets.insert(index + 1, copy);
        if self.active > index {
            self.active += 1;
        }
        Ok(index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellbook_engine::engine::CellRef;

    #[test]
    fn test_new_workbook_has_one_sheet() {
        let wb = Workbook::new(10, 40);
        assert_eq!(wb.name(), "Workbook");
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.active_sheet().name(), "Sheet1");
        assert_eq!(wb.active_sheet().bounds().columns, 10);
    }

    #[test]
    fn test_add_rename_find() {
        let mut wb = Workbook::new(10, 40);
        let index = wb.add_sheet(None, 5, 5).unwrap();
        assert_eq!(index, 1);
        assert_eq!(wb.active_index(), 1);
        assert_eq!(wb.active_sheet().name(), "Sheet2");

        wb.rename_sheet(1, "Budget").unwrap();
        assert_eq!(wb.find_sheet("Budget"), Some(1));
        assert!(matches!(wb.rename_sheet(1, "  "), Err(CellbookError::EmptyName)));
        assert!(matches!(wb.rename_sheet(7, "x"), Err(CellbookError::SheetIndex(7))));
    }

    #[test]
    fn test_delete_keeps_one_sheet() {
        let mut wb = Workbook::new(10, 40);
        assert!(matches!(wb.delete_sheet(0), Err(CellbookError::LastSheet)));

        wb.add_sheet(Some("Two"), 10, 40).unwrap();
        wb.add_sheet(Some("Three"), 10, 40).unwrap();
        assert_eq!(wb.active_index(), 2);
        let removed = wb.delete_sheet(2).unwrap();
        assert_eq!(removed.name(), "Three");
        assert_eq!(wb.active_index(), 1);

        // Deleting a sheet after the active one leaves it alone.
        wb.set_active_sheet(0).unwrap();
        wb.delete_sheet(1).unwrap();
        assert_eq!(wb.active_index(), 0);
    }

    #[test]
    fn test_sheet_ids_are_never_reused() {
        let mut wb = Workbook::new(10, 40);
        wb.add_sheet(None, 10, 40).unwrap();
        let second = wb.sheet(1).unwrap().id();
        wb.delete_sheet(1).unwrap();
        wb.add_sheet(None, 10, 40).unwrap();
        assert_ne!(wb.sheet(1).unwrap().id(), second);
    }

    #[test]
    fn test_duplicate_is_deep_copy() {
        let mut wb = Workbook::new(10, 40);
        wb.active_sheet_mut()
            .write(CellRef::new(0, 0), "original")
            .unwrap();
        let index = wb.duplicate_sheet(0).unwrap();
        assert_eq!(wb.sheet(index).unwrap().name(), "Sheet1 (copy)");
        assert_ne!(wb.sheet(index).unwrap().id(), wb.sheet(0).unwrap().id());

        wb.sheet_mut(index)
            .unwrap()
            .write(CellRef::new(0, 0), "changed")
            .unwrap();
        assert_eq!(wb.sheet(0).unwrap().visible_value(&CellRef::new(0, 0)), "original");
    }

    #[test]
    fn test_from_sheets_validates() {
        assert!(Workbook::from_sheets("x", vec![], 0).is_err());
        let sheets = vec![Sheet::new(9, "A", 2, 2), Sheet::new(9, "B", 2, 2)];
        assert!(Workbook::from_sheets("x", sheets.clone(), 2).is_err());
        let wb = Workbook::from_sheets("x", sheets, 1).unwrap();
        assert_ne!(wb.sheet(0).unwrap().id(), wb.sheet(1).unwrap().id());
        assert_eq!(wb.active_sheet().name(), "B");
    }
}
