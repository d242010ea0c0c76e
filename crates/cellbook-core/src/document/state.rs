use crate::error::Result;
use crate::history::History;
use crate::selection::Selection;
use crate::settings::Settings;
use crate::workbook::Workbook;
use std::path::PathBuf;

/// UI-agnostic session state for a workbook.
///
/// Every mutation goes through `Document`: it records history, recalculates
/// the touched sheet and keeps the selection inside the active sheet.
pub struct Document {
    /// The workbook being edited
    pub(crate) workbook: Workbook,
    /// Selected cells of the active sheet
    pub(crate) selection: Selection,
    /// Undo/redo stacks
    pub(crate) history: History,
    /// Limits and defaults
    pub(crate) settings: Settings,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the workbook has been modified since the last save/load
    pub modified: bool,
}

impl Document {
    /// Create a new document with default settings.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Document {
            workbook: Workbook::new(settings.default_columns, settings.default_rows),
            selection: Selection::new(),
            history: History::new(settings.history_capacity),
            settings,
            file_path: None,
            modified: false,
        }
    }

    /// Create a new document and load a file if provided. A path that does
    /// not exist yet becomes the save target of an empty workbook.
    pub fn with_file(path: Option<PathBuf>, settings: Settings) -> Result<Self> {
        let mut doc = Self::with_settings(settings);
        if let Some(p) = path {
            if p.exists() {
                doc.load_file(&p)?;
            } else {
                doc.file_path = Some(p);
                doc.modified = false;
            }
        }
        Ok(doc)
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
