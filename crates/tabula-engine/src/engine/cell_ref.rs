//! Cell address parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell
//! identifiers (e.g., "A1", "C12", "AA100") and 1-based column/row
//! coordinates. Columns use bijective base-26: there is no zero digit, so
//! "AA" follows "Z".
//!
//! # Examples
//!
//! ```
//! use tabula_engine::engine::CellAddress;
//!
//! let addr = CellAddress::decode("C12");
//! assert_eq!((addr.col, addr.row), (3, 12));
//! assert_eq!(addr.to_string(), "C12");
//! assert_eq!(CellAddress::encode(27, 1), "AA1");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A cell position by 1-based column and row.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellAddress {
    pub col: u32,
    pub row: u32,
}

impl CellAddress {
    pub fn new(col: u32, row: u32) -> CellAddress {
        CellAddress { col, row }
    }

    /// Decode an identifier, falling back to column A / row 1 for whichever
    /// part is missing. Never fails: upstream callers may pass partial tokens.
    pub fn decode(id: &str) -> CellAddress {
        let letters: String = id
            .chars()
            .skip_while(|c| !c.is_ascii_uppercase())
            .take_while(|c| c.is_ascii_uppercase())
            .collect();
        let digits: String = id
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();

        let col = if letters.is_empty() {
            1
        } else {
            letters.bytes().fold(0u32, |acc, b| {
                acc.saturating_mul(26).saturating_add(u32::from(b - b'A') + 1)
            })
        };
        let row = digits.parse::<u32>().ok().filter(|r| *r > 0).unwrap_or(1);

        CellAddress::new(col, row)
    }

    /// Strict parse: the whole input must be `[A-Za-z]+[0-9]+` with a
    /// positive row. Returns None if the input is not a cell identifier.
    pub fn parse(id: &str) -> Option<CellAddress> {
        let caps = address_re().captures(id)?;
        let col = letters_to_col(&caps["letters"])?;
        let row = caps["numbers"].parse::<u32>().ok().filter(|r| *r > 0)?;
        Some(CellAddress::new(col, row))
    }

    /// Canonical identifier for a column/row pair.
    pub fn encode(col: u32, row: u32) -> String {
        format!("{}{}", col_to_letters(col), row)
    }

    /// Shift by a column/row delta. A component that would leave the sheet
    /// (become zero or negative) keeps its current value.
    pub fn offset(&self, delta_col: i64, delta_row: i64) -> CellAddress {
        CellAddress::new(
            shift_component(self.col, delta_col),
            shift_component(self.row, delta_row),
        )
    }
}

fn shift_component(value: u32, delta: i64) -> u32 {
    let shifted = i64::from(value) + delta;
    if shifted > 0 {
        u32::try_from(shifted).unwrap_or(value)
    } else {
        value
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row)
    }
}

impl std::str::FromStr for CellAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellAddress::parse(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

/// Convert a 1-based column number to letters (1 -> A, 26 -> Z, 27 -> AA).
pub fn col_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        result.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    result
}

/// Convert column letters (case-insensitive) to a 1-based column number.
/// Returns None on empty input, non-letters or overflow.
pub fn letters_to_col(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut acc = 0u32;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        let digit = u32::from(b.to_ascii_uppercase() - b'A') + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    Some(acc)
}

/// One reference token inside a formula, e.g. `B2`, `$A$1`, `C$4`.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct CellReference {
    pub address: CellAddress,
    pub col_absolute: bool,
    pub row_absolute: bool,
}

impl CellReference {
    /// Parse a single reference token, honoring `$` markers.
    pub fn parse(token: &str) -> Option<CellReference> {
        let caps = reference_re().captures(token.trim())?;
        let col = letters_to_col(&caps[2])?;
        let row = caps[4].parse::<u32>().ok().filter(|r| *r > 0)?;
        Some(CellReference {
            address: CellAddress::new(col, row),
            col_absolute: !caps[1].is_empty(),
            row_absolute: !caps[3].is_empty(),
        })
    }

    /// Move the relative components by a delta; absolute components stay.
    pub fn translated(&self, delta_col: i64, delta_row: i64) -> CellReference {
        let shifted = self.address.offset(
            if self.col_absolute { 0 } else { delta_col },
            if self.row_absolute { 0 } else { delta_row },
        );
        CellReference {
            address: shifted,
            ..*self
        }
    }

    /// The bare identifier with all `$` markers dropped.
    pub fn identifier(&self) -> String {
        self.address.to_string()
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.col_absolute { "$" } else { "" },
            col_to_letters(self.address.col),
            if self.row_absolute { "$" } else { "" },
            self.address.row
        )
    }
}

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("cell address regex must compile")
    })
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\$?)([A-Za-z]+)(\$?)([0-9]+)$").expect("cell reference regex must compile")
    })
}

/// Unanchored reference token, uppercase only. Shared by the dependency
/// scanner and the reference translator.
pub(crate) fn reference_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$?[A-Z]+\$?[0-9]+").expect("reference token regex must compile"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_token_finds_uppercase_references() {
        let tokens: Vec<&str> = reference_token_re()
            .find_iter("=SUM($A$1, b2, AB$12, C$3)")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(tokens, vec!["$A$1", "AB$12", "C$3"]);
    }

    #[test]
    fn test_decode_single_and_double_letters() {
        assert_eq!(CellAddress::decode("A1"), CellAddress::new(1, 1));
        assert_eq!(CellAddress::decode("Z9"), CellAddress::new(26, 9));
        assert_eq!(CellAddress::decode("AA1"), CellAddress::new(27, 1));
        assert_eq!(CellAddress::decode("ZZ10000"), CellAddress::new(702, 10000));
    }

    #[test]
    fn test_decode_permissive_fallbacks() {
        assert_eq!(CellAddress::decode("12"), CellAddress::new(1, 12));
        assert_eq!(CellAddress::decode("C"), CellAddress::new(3, 1));
        assert_eq!(CellAddress::decode(""), CellAddress::new(1, 1));
        assert_eq!(CellAddress::decode("B0"), CellAddress::new(2, 1));
    }

    #[test]
    fn test_round_trip_all_columns() {
        for col in 1..=702 {
            for row in (1..=10_000).step_by(97).chain([10_000]) {
                let id = CellAddress::encode(col, row);
                assert_eq!(CellAddress::decode(&id), CellAddress::new(col, row), "{id}");
            }
        }
    }

    #[test]
    fn test_round_trip_all_rows() {
        for col in [1, 26, 27, 52, 702] {
            for row in 1..=10_000 {
                let id = CellAddress::encode(col, row);
                assert_eq!(CellAddress::decode(&id), CellAddress::new(col, row));
            }
        }
    }

    #[test]
    fn test_strict_parse_rejects_non_references() {
        assert!(CellAddress::parse("").is_none());
        assert!(CellAddress::parse("123").is_none());
        assert!(CellAddress::parse("ABC").is_none());
        assert!(CellAddress::parse("A0").is_none());
        assert!(CellAddress::parse("A 1").is_none());
        assert_eq!(CellAddress::parse("b2"), Some(CellAddress::new(2, 2)));
    }

    #[test]
    fn test_offset_floors_at_one() {
        let addr = CellAddress::new(2, 3);
        assert_eq!(addr.offset(1, 1), CellAddress::new(3, 4));
        assert_eq!(addr.offset(-5, -1), CellAddress::new(2, 2));
        assert_eq!(addr.offset(-1, -3), CellAddress::new(1, 3));
    }

    #[test]
    fn test_reference_flags_and_display() {
        let r = CellReference::parse("$A$1").unwrap();
        assert!(r.col_absolute && r.row_absolute);
        assert_eq!(r.to_string(), "$A$1");
        assert_eq!(r.identifier(), "A1");

        let mixed = CellReference::parse("B$2").unwrap();
        assert_eq!(mixed.translated(2, 5).to_string(), "D$2");
        assert_eq!(CellReference::parse("Z1").unwrap().translated(1, 0).to_string(), "AA1");
    }
}
