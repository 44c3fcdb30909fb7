//! tabula_engine - Spreadsheet formula engine: addressing, evaluation, recalculation.

pub(crate) mod builtins;
pub mod engine;
