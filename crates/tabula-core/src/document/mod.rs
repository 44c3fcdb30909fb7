//! Document state and logic (UI-agnostic).

mod io;
mod ops;
mod state;

pub use io::{MAX_DOCUMENT_BYTES, load_spreadsheet, save_spreadsheet};
pub use state::{Dimensions, NewSpreadsheet, Spreadsheet, SpreadsheetPatch, SpreadsheetSummary};
