//! Document state and logic (UI-agnostic).

mod format;
mod io;
mod ops;
mod state;

pub use format::{BorderKind, StyleFlag};
pub use state::Document;
