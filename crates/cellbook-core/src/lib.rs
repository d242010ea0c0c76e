//! cellbook-core - UI-agnostic workbook model, history + storage.

pub mod document;
pub mod error;
pub mod history;
pub mod selection;
pub mod settings;
pub mod sheet;
pub mod storage;
pub mod table;
pub mod workbook;

pub use document::{BorderKind, Document, StyleFlag};
pub use error::{CellbookError, Result};
pub use history::{History, HistoryEntry, UndoEntry};
pub use selection::Selection;
pub use settings::Settings;
pub use sheet::{Sheet, SheetId};
pub use table::{TABLE_STYLES, TableRegion, TableStyle};
pub use workbook::Workbook;

pub use cellbook_engine::engine::{CellRange, CellRef};
