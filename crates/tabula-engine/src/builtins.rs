//! The function catalogue.
//!
//! Every formula is a single call to one of these functions. Range-style
//! arguments go through the range expander; scalar arguments are single
//! cell references. POWER and ROUND take numbers only from cells.

use std::collections::HashSet;
use std::str::FromStr;

use crate::engine::{CellAddress, ErrorToken, FormulaResult, ResolveCell, expand_range};
use crate::engine::{format_number, parse_number, to_fixed};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Sum,
    Average,
    Max,
    Min,
    Count,
    Stdev,
    Product,
    Power,
    Round,
    Trim,
    Upper,
    Lower,
    RemoveDuplicates,
    FindAndReplace,
    Concatenate,
}

pub struct Builtin {
    pub kind: FunctionKind,
    pub name: &'static str,
    pub description: &'static str,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin { kind: FunctionKind::Sum, name: "SUM", description: "Sum of numeric values" },
    Builtin { kind: FunctionKind::Average, name: "AVERAGE", description: "Arithmetic mean" },
    Builtin { kind: FunctionKind::Max, name: "MAX", description: "Largest numeric value" },
    Builtin { kind: FunctionKind::Min, name: "MIN", description: "Smallest numeric value" },
    Builtin { kind: FunctionKind::Count, name: "COUNT", description: "Count of numeric cells" },
    Builtin { kind: FunctionKind::Stdev, name: "STDEV", description: "Sample standard deviation" },
    Builtin { kind: FunctionKind::Product, name: "PRODUCT", description: "Product of numeric values" },
    Builtin { kind: FunctionKind::Power, name: "POWER", description: "Base raised to exponent" },
    Builtin { kind: FunctionKind::Round, name: "ROUND", description: "Fixed-point rounding" },
    Builtin { kind: FunctionKind::Trim, name: "TRIM", description: "Strip surrounding whitespace" },
    Builtin { kind: FunctionKind::Upper, name: "UPPER", description: "Upper-case text" },
    Builtin { kind: FunctionKind::Lower, name: "LOWER", description: "Lower-case text" },
    Builtin {
        kind: FunctionKind::RemoveDuplicates,
        name: "REMOVE_DUPLICATES",
        description: "Distinct values joined by commas",
    },
    Builtin {
        kind: FunctionKind::FindAndReplace,
        name: "FIND_AND_REPLACE",
        description: "Replace every occurrence of a literal",
    },
    Builtin {
        kind: FunctionKind::Concatenate,
        name: "CONCATENATE",
        description: "Join values with no separator",
    },
];

impl FunctionKind {
    pub fn name(&self) -> &'static str {
        BUILTINS
            .iter()
            .find(|b| b.kind == *self)
            .map(|b| b.name)
            .unwrap_or_default()
    }
}

impl FromStr for FunctionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BUILTINS
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(s))
            .map(|b| b.kind)
            .ok_or_else(|| format!("Unknown function: {}", s))
    }
}

/// Run a catalogue function over its raw argument text.
pub(crate) fn call<R: ResolveCell + ?Sized>(
    kind: FunctionKind,
    args: &str,
    resolver: &R,
) -> FormulaResult {
    tracing::trace!(function = kind.name(), args, "calling builtin");

    match kind {
        FunctionKind::Sum => {
            let values = numeric_values(args, resolver)?;
            Ok(format_number(values.iter().sum()))
        }
        FunctionKind::Average => {
            let values = numeric_values(args, resolver)?;
            if values.is_empty() {
                return Err(ErrorToken::DivByZero);
            }
            Ok(format_number(mean(&values)))
        }
        FunctionKind::Max => {
            let values = numeric_values(args, resolver)?;
            values
                .into_iter()
                .reduce(f64::max)
                .map(format_number)
                .ok_or(ErrorToken::NotAvailable)
        }
        FunctionKind::Min => {
            let values = numeric_values(args, resolver)?;
            values
                .into_iter()
                .reduce(f64::min)
                .map(format_number)
                .ok_or(ErrorToken::NotAvailable)
        }
        FunctionKind::Count => {
            let values = numeric_values(args, resolver)?;
            Ok(values.len().to_string())
        }
        FunctionKind::Stdev => {
            let values = numeric_values(args, resolver)?;
            if values.len() < 2 {
                return Err(ErrorToken::NotAvailable);
            }
            let avg = mean(&values);
            let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>()
                / (values.len() - 1) as f64;
            Ok(format_number(variance.sqrt()))
        }
        FunctionKind::Product => {
            let values = numeric_values(args, resolver)?;
            if values.is_empty() {
                return Ok("0".to_string());
            }
            Ok(format_number(values.iter().product()))
        }
        FunctionKind::Power => {
            let mut parts = args.split(',');
            let base = scalar_arg(parts.next(), resolver)?;
            let exponent = scalar_arg(parts.next(), resolver)?;
            Ok(format_number(base.powf(exponent)))
        }
        FunctionKind::Round => {
            let mut parts = args.split(',');
            let number = scalar_arg(parts.next(), resolver)?;
            let decimals = scalar_arg(parts.next(), resolver)?.trunc();
            if !(0.0..=100.0).contains(&decimals) {
                return Err(ErrorToken::Error);
            }
            Ok(to_fixed(number, decimals as usize))
        }
        FunctionKind::Trim => Ok(text_arg(args, resolver).trim().to_string()),
        FunctionKind::Upper => Ok(text_arg(args, resolver).to_uppercase()),
        FunctionKind::Lower => Ok(text_arg(args, resolver).to_lowercase()),
        FunctionKind::RemoveDuplicates => {
            let cells = range_cells(args)?;
            let mut seen: HashSet<Option<String>> = HashSet::new();
            let unique: Vec<String> = cells
                .iter()
                .map(|id| resolver.resolve(id))
                .filter(|value| seen.insert(value.clone()))
                .flatten()
                .collect();
            Ok(unique.join(","))
        }
        FunctionKind::FindAndReplace => {
            let params: Vec<&str> = args.split(',').map(str::trim).collect();
            let [target, find, replace] = params.as_slice() else {
                return Err(ErrorToken::Error);
            };
            let value = resolver
                .resolve(&normalize_ref(target))
                .unwrap_or_default();
            // Both literals are upper-cased before matching.
            let find = strip_quotes(find).to_uppercase();
            if value.is_empty() || find.is_empty() {
                return Ok(value);
            }
            Ok(value.replace(&find, &strip_quotes(replace).to_uppercase()))
        }
        FunctionKind::Concatenate => {
            let cells = range_cells(args)?;
            Ok(cells
                .iter()
                .map(|id| resolver.resolve(id).unwrap_or_default())
                .collect())
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn range_cells(args: &str) -> Result<Vec<String>, ErrorToken> {
    expand_range(&args.to_ascii_uppercase()).map_err(|err| {
        tracing::warn!(%err, "range rejected");
        ErrorToken::Error
    })
}

/// Numeric values found in a range. Missing, empty and non-numeric cells
/// are skipped.
fn numeric_values<R: ResolveCell + ?Sized>(args: &str, resolver: &R) -> Result<Vec<f64>, ErrorToken> {
    Ok(range_cells(args)?
        .iter()
        .filter_map(|id| resolver.resolve(id))
        .filter_map(|value| parse_number(&value))
        .collect())
}

/// A single numeric operand. It must be a cell reference holding a number.
fn scalar_arg<R: ResolveCell + ?Sized>(arg: Option<&str>, resolver: &R) -> Result<f64, ErrorToken> {
    let arg = arg.map(normalize_ref).ok_or(ErrorToken::Error)?;
    CellAddress::parse(&arg).ok_or(ErrorToken::Error)?;
    resolver
        .resolve(&arg)
        .and_then(|value| parse_number(&value))
        .ok_or(ErrorToken::Error)
}

fn text_arg<R: ResolveCell + ?Sized>(args: &str, resolver: &R) -> String {
    resolver.resolve(&normalize_ref(args)).unwrap_or_default()
}

fn normalize_ref(raw: &str) -> String {
    raw.trim().replace('$', "").to_ascii_uppercase()
}

/// Drop one leading and one trailing quote character (either kind).
fn strip_quotes(literal: &str) -> &str {
    let literal = literal
        .strip_prefix(['"', '\''])
        .unwrap_or(literal);
    literal.strip_suffix(['"', '\'']).unwrap_or(literal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Cell, Grid, evaluate};

    fn grid(cells: &[(&str, &str)]) -> Grid {
        cells
            .iter()
            .map(|(id, v)| (id.to_string(), Cell::from_input(v)))
            .collect()
    }

    #[test]
    fn test_function_kind_from_str() {
        assert_eq!("sum".parse::<FunctionKind>(), Ok(FunctionKind::Sum));
        assert_eq!(
            "REMOVE_DUPLICATES".parse::<FunctionKind>(),
            Ok(FunctionKind::RemoveDuplicates)
        );
        assert!("SUMX".parse::<FunctionKind>().is_err());
        assert_eq!(FunctionKind::FindAndReplace.name(), "FIND_AND_REPLACE");
    }

    #[test]
    fn test_aggregates_skip_non_numeric() {
        let g = grid(&[("A1", "3"), ("A2", "x"), ("A3", "5")]);
        assert_eq!(evaluate("=SUM(A1:A3)", &g), "8");
        assert_eq!(evaluate("=COUNT(A1:A3)", &g), "2");
        assert_eq!(evaluate("=AVERAGE(A1:A3)", &g), "4");
        assert_eq!(evaluate("=MAX(A1:A3)", &g), "5");
        assert_eq!(evaluate("=MIN(A1:A3)", &g), "3");
        assert_eq!(evaluate("=PRODUCT(A1:A3)", &g), "15");
    }

    #[test]
    fn test_empty_ranges() {
        let g = Grid::new();
        assert_eq!(evaluate("=SUM(A1:A3)", &g), "0");
        assert_eq!(evaluate("=COUNT(A1:A3)", &g), "0");
        assert_eq!(evaluate("=PRODUCT(A1:A3)", &g), "0");
        assert_eq!(evaluate("=AVERAGE(A1:A3)", &g), "#DIV/0!");
        assert_eq!(evaluate("=MAX(A1:A3)", &g), "#N/A");
        assert_eq!(evaluate("=MIN(A1:A3)", &g), "#N/A");
        assert_eq!(evaluate("=STDEV(A1:A3)", &g), "#N/A");
    }

    #[test]
    fn test_stdev_is_sample() {
        let g = grid(&[("A1", "2"), ("A2", "4"), ("A3", "4"), ("A4", "4"), ("A5", "5"), ("A6", "5"), ("A7", "7"), ("A8", "9")]);
        let result: f64 = evaluate("=STDEV(A1:A8)", &g).parse().unwrap();
        assert!((result - 2.138_089_935_299_395).abs() < 1e-12);
    }

    #[test]
    fn test_power_and_round() {
        let g = grid(&[
            ("A1", "2"),
            ("B1", "10"),
            ("C1", "2.5"),
            ("D1", "abc"),
            ("E1", "0"),
            ("F1", "-1"),
            ("G1", "3.14159"),
        ]);
        assert_eq!(evaluate("=POWER(A1, B1)", &g), "1024");
        assert_eq!(evaluate("=POWER($A$1, B1)", &g), "1024");
        assert_eq!(evaluate("=POWER(A1)", &g), "#ERROR!");
        assert_eq!(evaluate("=POWER(A1, Z9)", &g), "#ERROR!");
        assert_eq!(evaluate("=POWER(A1, D1)", &g), "#ERROR!");
        assert_eq!(evaluate("=ROUND(C1, E1)", &g), "3");
        assert_eq!(evaluate("=ROUND(B1, A1)", &g), "10.00");
        assert_eq!(evaluate("=ROUND(C1, F1)", &g), "#ERROR!");
    }

    #[test]
    fn test_power_and_round_reject_number_literals() {
        let g = grid(&[("A1", "2"), ("G1", "3.14159")]);
        assert_eq!(evaluate("=POWER(A1, 3)", &g), "#ERROR!");
        assert_eq!(evaluate("=POWER(2, A1)", &g), "#ERROR!");
        assert_eq!(evaluate("=ROUND(G1, 2)", &g), "#ERROR!");
        assert_eq!(evaluate("=ROUND(G1, -1)", &g), "#ERROR!");
    }

    #[test]
    fn test_text_functions() {
        let g = grid(&[("A1", "  Mixed Case  ")]);
        assert_eq!(evaluate("=TRIM(A1)", &g), "Mixed Case");
        assert_eq!(evaluate("=UPPER($A$1)", &g), "  MIXED CASE  ");
        assert_eq!(evaluate("=LOWER( a1 )", &g), "  mixed case  ");
        assert_eq!(evaluate("=TRIM(B1)", &g), "");
    }

    #[test]
    fn test_remove_duplicates_and_concatenate() {
        let g = grid(&[("A1", "x"), ("A2", "y"), ("A3", "x"), ("A5", "z")]);
        assert_eq!(evaluate("=REMOVE_DUPLICATES(A1:A6)", &g), "x,y,z");
        assert_eq!(evaluate("=CONCATENATE(A1:A5)", &g), "xyxz");
        assert_eq!(evaluate("=CONCATENATE(A5, A1)", &g), "zx");
    }

    #[test]
    fn test_find_and_replace() {
        let g = grid(&[("A1", "FOO bar FOO"), ("C1", "foo bar")]);
        assert_eq!(evaluate("=FIND_AND_REPLACE(A1, \"foo\", \"baz\")", &g), "BAZ bar BAZ");
        assert_eq!(evaluate("=FIND_AND_REPLACE(A1, 'FOO', '')", &g), " bar ");
        assert_eq!(evaluate("=FIND_AND_REPLACE(A1, \"\", \"x\")", &g), "FOO bar FOO");
        assert_eq!(evaluate("=FIND_AND_REPLACE(B1, \"a\", \"b\")", &g), "");
        assert_eq!(evaluate("=FIND_AND_REPLACE(A1, \"foo\")", &g), "#ERROR!");
        assert_eq!(evaluate("=FIND_AND_REPLACE(A1, a, b, c)", &g), "#ERROR!");
    }

    #[test]
    fn test_find_and_replace_matches_upper_cased_literals() {
        let g = grid(&[("A1", "foo bar"), ("A2", "FOO BAR")]);
        // Lower-case text never matches the upper-cased find literal.
        assert_eq!(evaluate("=FIND_AND_REPLACE(A1, \"foo\", \"baz\")", &g), "foo bar");
        assert_eq!(evaluate("=FIND_AND_REPLACE(A2, \"foo\", \"baz\")", &g), "BAZ BAR");
    }

    #[test]
    fn test_oversize_range_is_error() {
        assert_eq!(evaluate("=SUM(A1:ZZ100000)", &Grid::new()), "#ERROR!");
    }
}
