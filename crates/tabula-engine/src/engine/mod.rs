//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`Cell`], [`CellUpdate`], [`Grid`] - Data structures for cell storage
//! - [`CellAddress`], [`CellReference`] - A1 notation ↔ 1-based column/row
//! - [`find_cell_dependencies`], [`DependencyGraph`] - Formula dependencies
//! - [`expand_range`] - Range arguments to cell identifiers
//! - [`evaluate`] - Run a formula against a grid
//! - [`apply_edit`], [`Recalculator`] - Edit a cell and recalculate
//! - [`translate`] - Shift relative references for copy and fill
//! - [`display_value`], [`format_number`] - Format values for display

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod eval;
mod format;
mod range;
mod recalc;
mod translate;

pub use cell::{
    Align, Cell, CellFormat, CellUpdate, DataType, Grid, ValidationError, infer_type,
    validate_input,
};
pub use cell_ref::{CellAddress, CellReference, col_to_letters, letters_to_col};
pub use cycle::detect_cycle;
pub use deps::{DependencyGraph, find_cell_dependencies, formula_dependencies};
pub use eval::{ErrorToken, FormulaResult, ResolveCell, evaluate, evaluate_formula};
pub use format::{display_value, format_number, parse_number, to_fixed};
pub use range::{MAX_RANGE_CELLS, RangeError, Reference, expand_range};
pub use recalc::{RecalcMode, Recalculator, apply_edit, canonical_id, recalculate_all};
pub use translate::{offset_formula_references, translate};

pub use crate::builtins::{BUILTINS, Builtin, FunctionKind};
