//! tabula-core - UI-agnostic document model, document store + storage.

pub mod document;
pub mod error;
pub mod store;

pub use document::{
    NewSpreadsheet, Spreadsheet, SpreadsheetPatch, SpreadsheetSummary, load_spreadsheet,
    save_spreadsheet,
};
pub use error::{Result, TabulaError};
pub use store::DocumentStore;

pub use tabula_engine::engine::{Cell, CellUpdate, Grid, RecalcMode, Recalculator};
