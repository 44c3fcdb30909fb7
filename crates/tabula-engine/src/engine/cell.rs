//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`DataType`] - The declared type of a literal cell (text, number, date, boolean)
//! - [`CellFormat`] - Display-only formatting, never read by evaluation
//! - [`Cell`] - Raw value, optional formula, type and format
//! - [`CellUpdate`] - A partial update merged into a cell by an edit
//! - [`Grid`] - Sparse storage keyed by canonical cell identifier

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

/// The declared type of a cell's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Number,
    Date,
    Boolean,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Display formatting. Owned by the UI; the engine carries it untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
}

impl CellFormat {
    /// Overlay the fields set in `other` onto this format.
    pub fn merge(&mut self, other: CellFormat) {
        if other.bold.is_some() {
            self.bold = other.bold;
        }
        if other.italic.is_some() {
            self.italic = other.italic;
        }
        if other.font_size.is_some() {
            self.font_size = other.font_size;
        }
        if other.color.is_some() {
            self.color = other.color;
        }
        if other.align.is_some() {
            self.align = other.align;
        }
    }
}

/// A cell in the spreadsheet grid.
///
/// `value` is the displayed content: the raw input for literal cells, the
/// computed result (or error token) for formula cells. `formula` is present
/// only when the cell holds a formula, and then always starts with `=`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<CellFormat>,
}

impl Cell {
    /// Build a cell from raw user input.
    /// - Starts with '=' -> formula (value holds the input until evaluated)
    /// - Otherwise -> literal value with an inferred type
    pub fn from_input(input: &str) -> Cell {
        if input.starts_with('=') {
            Cell {
                value: Some(input.to_string()),
                formula: Some(input.to_string()),
                ..Cell::default()
            }
        } else {
            Cell {
                value: Some(input.to_string()),
                formula: None,
                kind: Some(infer_type(input)),
                format: None,
            }
        }
    }

    pub fn has_formula(&self) -> bool {
        self.formula.as_deref().is_some_and(|f| f.starts_with('='))
    }

    /// True when the cell reads as empty (no value, no formula).
    pub fn is_blank(&self) -> bool {
        self.value.as_deref().is_none_or(str::is_empty) && !self.has_formula()
    }

    /// Merge a partial update into this cell.
    ///
    /// Set fields overwrite; an empty `formula` clears the formula and an
    /// empty `value` clears the value. `format` is merged field by field.
    /// A new literal value without an explicit type gets an inferred type.
    pub fn apply(&mut self, update: CellUpdate) {
        let value_changed = update.value.is_some();

        if let Some(value) = update.value {
            self.value = if value.is_empty() { None } else { Some(value) };
        }
        if let Some(formula) = update.formula {
            self.formula = if formula.is_empty() { None } else { Some(formula) };
        }
        match update.kind {
            Some(kind) => self.kind = Some(kind),
            None if value_changed && !self.has_formula() => {
                self.kind = self.value.as_deref().map(infer_type);
            }
            None => {}
        }
        if let Some(format) = update.format {
            self.format.get_or_insert_with(CellFormat::default).merge(format);
        }
    }
}

/// A partial cell update; `None` fields leave the cell untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellUpdate {
    pub value: Option<String>,
    pub formula: Option<String>,
    pub kind: Option<DataType>,
    pub format: Option<CellFormat>,
}

impl CellUpdate {
    pub fn value(value: impl Into<String>) -> CellUpdate {
        CellUpdate {
            value: Some(value.into()),
            ..CellUpdate::default()
        }
    }

    pub fn formula(formula: impl Into<String>) -> CellUpdate {
        CellUpdate {
            formula: Some(formula.into()),
            ..CellUpdate::default()
        }
    }

    /// Formula-bar semantics: `=...` sets formula and value, anything else
    /// sets the value and clears a previous formula.
    pub fn input(raw: &str) -> CellUpdate {
        if raw.starts_with('=') {
            CellUpdate {
                value: Some(raw.to_string()),
                formula: Some(raw.to_string()),
                ..CellUpdate::default()
            }
        } else {
            CellUpdate {
                value: Some(raw.to_string()),
                formula: Some(String::new()),
                ..CellUpdate::default()
            }
        }
    }

    /// Clear both value and formula (logical deletion).
    pub fn clear() -> CellUpdate {
        CellUpdate {
            value: Some(String::new()),
            formula: Some(String::new()),
            ..CellUpdate::default()
        }
    }

    pub fn format(format: CellFormat) -> CellUpdate {
        CellUpdate {
            format: Some(format),
            ..CellUpdate::default()
        }
    }
}

/// Sparse grid storage keyed by canonical cell identifier.
pub type Grid = BTreeMap<String, Cell>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid date format. Use YYYY-MM-DD")]
    InvalidDate,
}

/// Classify raw input. Dates must be real calendar dates.
pub fn validate_input(raw: &str) -> Result<DataType, ValidationError> {
    if number_re().is_match(raw) && raw.bytes().any(|b| b.is_ascii_digit()) {
        return Ok(DataType::Number);
    }
    if date_re().is_match(raw) {
        return match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(_) => Ok(DataType::Date),
            Err(_) => Err(ValidationError::InvalidDate),
        };
    }
    if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
        return Ok(DataType::Boolean);
    }
    Ok(DataType::Text)
}

/// Like [`validate_input`] but falls back to text on invalid input.
pub fn infer_type(raw: &str) -> DataType {
    validate_input(raw).unwrap_or(DataType::Text)
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d*\.?\d*$").expect("number regex must compile"))
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex must compile"))
}
