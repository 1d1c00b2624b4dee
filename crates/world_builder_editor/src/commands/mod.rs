//! Undo/redo history

mod history;

pub use history::{EditHistory, DEFAULT_HISTORY_LIMIT};
