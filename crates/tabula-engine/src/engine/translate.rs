//! Reference translation for copy and fill.
//!
//! When a formula moves from one cell to another, its relative references
//! shift by the same column/row delta. `$`-marked components stay put, and a
//! component that would leave the sheet (index <= 0) is left unchanged.
//! Text inside quoted string literals is never rewritten.

use regex::Captures;

use super::cell_ref::{CellAddress, CellReference, reference_token_re};

/// Translate a formula written in `from` so it reads correctly in `to`.
/// Non-formulas are returned unchanged.
pub fn translate(formula: &str, from: &str, to: &str) -> String {
    if !formula.starts_with('=') {
        return formula.to_string();
    }
    let from = CellAddress::decode(&from.to_ascii_uppercase());
    let to = CellAddress::decode(&to.to_ascii_uppercase());
    let delta_col = i64::from(to.col) - i64::from(from.col);
    let delta_row = i64::from(to.row) - i64::from(from.row);
    offset_formula_references(formula, delta_col, delta_row)
}

/// Offset every cell reference in a formula by a column/row delta.
pub fn offset_formula_references(formula: &str, delta_col: i64, delta_row: i64) -> String {
    if delta_col == 0 && delta_row == 0 {
        return formula.to_string();
    }

    let shift = |seg: &str| {
        reference_token_re()
            .replace_all(seg, |caps: &Captures| {
                let token = &caps[0];
                match CellReference::parse(token) {
                    Some(reference) => reference.translated(delta_col, delta_row).to_string(),
                    None => token.to_string(),
                }
            })
            .into_owned()
    };

    map_outside_strings(formula, shift)
}

/// Apply `f` to every segment of `text` outside `"..."` and `'...'` literals.
/// A backslash escapes the next character inside a literal.
fn map_outside_strings(text: &str, f: impl Fn(&str) -> String) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut seg_start = 0;
    let mut quote: Option<u8> = None;
    let mut backslashes = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) => {
                if b == b'\\' {
                    backslashes += 1;
                    continue;
                }
                if b == q && backslashes.is_multiple_of(2) {
                    out.push_str(&text[seg_start..=i]);
                    quote = None;
                    seg_start = i + 1;
                }
                backslashes = 0;
            }
            None => {
                if b == b'"' || b == b'\'' {
                    out.push_str(&f(&text[seg_start..i]));
                    quote = Some(b);
                    seg_start = i;
                    backslashes = 0;
                }
            }
        }
    }

    // Unterminated literals are kept verbatim.
    match quote {
        Some(_) => out.push_str(&text[seg_start..]),
        None => out.push_str(&f(&text[seg_start..])),
    }
    out
}
