//! Style toolbar operations over the current selection.

use super::Document;
use crate::error::{CellbookError, Result};
use crate::history::HistoryEntry;
use crate::table::TableStyle;
use cellbook_engine::engine::{BorderSpec, Cell, CellRange, CellRef, CellStyle};

/// Boolean style attributes that toggle per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleFlag {
    Bold,
    Italic,
    Underline,
    Wrap,
}

impl StyleFlag {
    fn slot(self, style: &mut CellStyle) -> &mut bool {
        match self {
            StyleFlag::Bold => &mut style.bold,
            StyleFlag::Italic => &mut style.italic,
            StyleFlag::Underline => &mut style.underline,
            StyleFlag::Wrap => &mut style.wrap,
        }
    }
}

/// Border presets, applied against the selection's bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderKind {
    None,
    All,
    Outside,
    Inside,
    Top,
    Bottom,
    Left,
    Right,
}

impl BorderKind {
    pub fn from_name(name: &str) -> Option<BorderKind> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "none" => BorderKind::None,
            "all" => BorderKind::All,
            "outside" => BorderKind::Outside,
            "inside" => BorderKind::Inside,
            "top" => BorderKind::Top,
            "bottom" => BorderKind::Bottom,
            "left" => BorderKind::Left,
            "right" => BorderKind::Right,
            _ => return None,
        };
        Some(kind)
    }

    /// Sides of `cell` that carry a line inside `region`.
    fn sides(self, cell: &CellRef, region: &CellRange) -> BorderSpec {
        let on_top = cell.row == region.start.row;
        let on_bottom = cell.row == region.end.row;
        let on_left = cell.col == region.start.col;
        let on_right = cell.col == region.end.col;
        match self {
            BorderKind::None => BorderSpec::default(),
            BorderKind::All => BorderSpec::ALL,
            BorderKind::Outside => BorderSpec {
                top: on_top,
                right: on_right,
                bottom: on_bottom,
                left: on_left,
            },
            BorderKind::Inside => BorderSpec {
                top: !on_top,
                right: !on_right,
                bottom: !on_bottom,
                left: !on_left,
            },
            BorderKind::Top => BorderSpec {
                top: on_top,
                ..BorderSpec::default()
            },
            BorderKind::Bottom => BorderSpec {
                bottom: on_bottom,
                ..BorderSpec::default()
            },
            BorderKind::Left => BorderSpec {
                left: on_left,
                ..BorderSpec::default()
            },
            BorderKind::Right => BorderSpec {
                right: on_right,
                ..BorderSpec::default()
            },
        }
    }
}

impl Document {
    /// Apply `update` to the style of every cell in `cells` on the active
    /// sheet and return the changes, without recording them.
    fn apply_styles<I, F>(&mut self, cells: I, mut update: F) -> Vec<HistoryEntry>
    where
        I: IntoIterator<Item = CellRef>,
        F: FnMut(&CellRef, &mut CellStyle),
    {
        let sheet = self.workbook.active_sheet_mut();
        let sheet_id = sheet.id();
        let bounds = sheet.bounds();
        let mut entries = Vec::new();

        for cell_ref in cells {
            if !bounds.contains(&cell_ref) {
                continue;
            }
            let previous = sheet.read(&cell_ref);
            let mut next = previous
                .clone()
                .unwrap_or_else(|| Cell::style_only(CellStyle::default()));
            let mut style = next.style.take().unwrap_or_default();
            update(&cell_ref, &mut style);
            next.style = Some(style);
            if previous.as_ref() == Some(&next) {
                continue;
            }
            sheet.put(cell_ref, Some(next.clone()));
            entries.push(HistoryEntry {
                sheet_id,
                cell_ref,
                previous,
                next: Some(next),
            });
        }
        entries
    }

    /// Restyle `cells` and record the changes as one batch. Returns the
    /// number of cells that changed.
    fn restyle<I, F>(&mut self, cells: I, update: F) -> usize
    where
        I: IntoIterator<Item = CellRef>,
        F: FnMut(&CellRef, &mut CellStyle),
    {
        let entries = self.apply_styles(cells, update);
        let changed = entries.len();
        self.commit(entries);
        changed
    }

    fn selected_cells(&self) -> Vec<CellRef> {
        self.selection.cells().copied().collect()
    }

    /// Flip a boolean style attribute on each selected cell.
    pub fn toggle_style(&mut self, flag: StyleFlag) -> Result<usize> {
        let cells = self.selected_cells();
        Ok(self.restyle(cells, |_, style| {
            let slot = flag.slot(style);
            *slot = !*slot;
        }))
    }

    /// Advance each selected cell's alignment: left, center, right, left.
    pub fn cycle_align(&mut self) -> Result<usize> {
        let cells = self.selected_cells();
        Ok(self.restyle(cells, |_, style| style.align = style.align.next()))
    }

    /// Set (or with `None`, clear) the fill colour of the selection.
    pub fn apply_fill(&mut self, color: Option<&str>) -> Result<usize> {
        let cells = self.selected_cells();
        let fill = color.filter(|c| !c.is_empty()).map(str::to_string);
        Ok(self.restyle(cells, |_, style| style.fill = fill.clone()))
    }

    /// Apply a border preset to the selected cells.
    pub fn apply_borders(&mut self, kind: BorderKind) -> Result<usize> {
        let region = self.selection.bounds().ok_or(CellbookError::EmptySelection)?;
        let cells = self.selected_cells();
        Ok(self.restyle(cells, |cell_ref, style| {
            let sides = kind.sides(cell_ref, &region);
            style.border = if sides.is_empty() { None } else { Some(sides) };
        }))
    }

    /// Turn the selection's bounding rectangle into a table: the header row
    /// gets the preset's header fill and bold text. The region and its
    /// header styling undo together. Returns the table id.
    pub fn insert_table(&mut self, style: &TableStyle) -> Result<u64> {
        let region = self.selection.bounds().ok_or(CellbookError::EmptySelection)?;
        let header_cells: Vec<CellRef> = (region.start.col..=region.end.col)
            .map(|col| CellRef::new(col, region.start.row))
            .collect();

        let header_color = style.header_color.to_string();
        let cells = self.apply_styles(header_cells, |_, cell_style| {
            cell_style.fill = Some(header_color.clone());
            cell_style.bold = true;
        });
        let sheet = self.workbook.active_sheet_mut();
        let sheet_id = sheet.id();
        let table = sheet
            .add_table(region, style.header_color, style.body_color)
            .clone();
        let id = table.id;
        self.history.record_table(sheet_id, table, cells);
        self.modified = true;
        Ok(id)
    }

    /// Look up a preset by name and insert a table with it.
    pub fn insert_table_named(&mut self, style_name: &str) -> Result<u64> {
        let style = TableStyle::by_name(style_name)
            .ok_or_else(|| CellbookError::UnknownTableStyle(style_name.to_string()))?;
        self.insert_table(&style)
    }
}
