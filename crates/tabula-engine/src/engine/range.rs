//! Range expansion.
//!
//! Turns the argument text of a range function into the ordered list of cell
//! identifiers it covers:
//!
//! - `A1` stays a single reference
//! - `A1, B2, C3` is a list; components are returned as written
//! - `A1:B3` is a rectangle, emitted column by column (`A1 A2 A3 B1 B2 B3`)

use thiserror::Error;

use super::cell_ref::{CellAddress, col_to_letters};

/// Upper bound on the number of cells a single range may expand to.
pub const MAX_RANGE_CELLS: u64 = 1_000_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("range {range} covers {cells} cells (max {MAX_RANGE_CELLS})")]
    TooLarge { range: String, cells: u64 },
}

/// The parsed shape of a range argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    Single(String),
    List(Vec<String>),
    Range(CellAddress, CellAddress),
    /// A colon range whose corners are not cell identifiers; covers nothing.
    Malformed(String),
}

impl Reference {
    pub fn parse(raw: &str) -> Reference {
        let text = raw.replace('$', "");

        if text.contains(',') {
            return Reference::List(text.split(',').map(|s| s.trim().to_string()).collect());
        }

        let mut parts = text.split(':');
        let start = parts.next().unwrap_or_default().trim();
        let end = parts.next().map(str::trim).unwrap_or_default();
        if end.is_empty() {
            return Reference::Single(start.to_string());
        }

        match (CellAddress::parse(start), CellAddress::parse(end)) {
            (Some(start), Some(end)) => Reference::Range(start, end),
            _ => Reference::Malformed(text),
        }
    }

    /// Concrete identifiers covered by this reference.
    pub fn cells(&self) -> Result<Vec<String>, RangeError> {
        match self {
            Reference::Single(id) => Ok(vec![id.clone()]),
            Reference::List(ids) => Ok(ids.clone()),
            Reference::Malformed(_) => Ok(Vec::new()),
            Reference::Range(start, end) => {
                if start.col > end.col || start.row > end.row {
                    return Ok(Vec::new());
                }
                let cols = u64::from(end.col - start.col) + 1;
                let rows = u64::from(end.row - start.row) + 1;
                let cells = cols * rows;
                if cells > MAX_RANGE_CELLS {
                    return Err(RangeError::TooLarge {
                        range: format!("{}:{}", start, end),
                        cells,
                    });
                }

                let mut out = Vec::with_capacity(cells as usize);
                for col in start.col..=end.col {
                    let letters = col_to_letters(col);
                    for row in start.row..=end.row {
                        out.push(format!("{}{}", letters, row));
                    }
                }
                Ok(out)
            }
        }
    }
}

/// Expand raw range text into an ordered list of cell identifiers.
pub fn expand_range(raw: &str) -> Result<Vec<String>, RangeError> {
    Reference::parse(raw).cells()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_reference_is_unexpanded() {
        assert_eq!(expand_range("$B$7").unwrap(), vec!["B7"]);
        assert_eq!(expand_range("A1:").unwrap(), vec!["A1"]);
    }

    #[test]
    fn test_list_components_returned_as_written() {
        assert_eq!(expand_range("A1, $B2 ,C3").unwrap(), vec!["A1", "B2", "C3"]);
        assert_eq!(expand_range("A1:A3,B1").unwrap(), vec!["A1:A3", "B1"]);
    }

    #[test]
    fn test_rectangle_is_column_major() {
        assert_eq!(
            expand_range("A1:B3").unwrap(),
            vec!["A1", "A2", "A3", "B1", "B2", "B3"]
        );
    }

    #[test]
    fn test_range_crosses_z_boundary() {
        assert_eq!(
            expand_range("Y1:AB1").unwrap(),
            vec!["Y1", "Z1", "AA1", "AB1"]
        );
    }

    #[test]
    fn test_reversed_and_malformed_ranges_are_empty() {
        assert!(expand_range("B1:A1").unwrap().is_empty());
        assert!(expand_range(":A1").unwrap().is_empty());
        assert!(expand_range("").unwrap() == vec![String::new()]);
    }

    #[test]
    fn test_oversize_range_is_rejected() {
        let err = expand_range("A1:ZZ100000").unwrap_err();
        assert!(matches!(err, RangeError::TooLarge { cells: 70_200_000, .. }));
    }
}
