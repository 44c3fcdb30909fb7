//! Number parsing and value formatting.
//!
//! Cell values are plain text. Numeric functions read them with
//! [`parse_number`], which accepts the longest numeric prefix (so `"12abc"`
//! reads as 12), and write results back with [`format_number`], which
//! produces the shortest text that round-trips.

use chrono::NaiveDate;

use super::cell::{Cell, DataType};

/// Digits needed to print any finite f64 exactly in fixed notation.
const EXACT_DIGITS: usize = 1100;

/// Largest magnitude printed in fixed notation; beyond it exponent form is used.
const FIXED_NOTATION_LIMIT: f64 = 1e21;

/// Parse the leading number of a string, ignoring leading whitespace and any
/// trailing garbage. Returns None when no digits lead the string.
pub fn parse_number(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return Some(if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Format a number the way a cell displays a computed result:
/// integers without a fraction, shortest round-trip digits otherwise,
/// exponent form for very large or very small magnitudes.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let magnitude = n.abs();
    if magnitude >= FIXED_NOTATION_LIMIT || magnitude < 1e-6 {
        let exp = format!("{:e}", n);
        match exp.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => exp,
        }
    } else {
        format!("{}", n)
    }
}

/// Fixed-point rendering with `digits` fraction digits. Ties round away from
/// zero on the exact binary value, so `1.005` (really 1.00499...) gives
/// `1.00` while `2.5` gives `3`.
pub fn to_fixed(x: f64, digits: usize) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.abs() >= FIXED_NOTATION_LIMIT {
        return format_number(x);
    }

    let exact = format!("{:.*}", EXACT_DIGITS, x.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(digits))
        .collect();
    let round_up = frac_part
        .as_bytes()
        .get(digits)
        .is_some_and(|b| *b >= b'5');

    if round_up {
        let mut i = kept.len();
        loop {
            if i == 0 {
                kept.insert(0, b'1');
                break;
            }
            i -= 1;
            if kept[i] == b'9' {
                kept[i] = b'0';
            } else {
                kept[i] += 1;
                break;
            }
        }
    }

    let int_len = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if x < 0.0 {
        out.push('-');
    }
    out.extend(kept[..int_len].iter().map(|b| *b as char));
    if digits > 0 {
        out.push('.');
        out.extend(kept[int_len..].iter().map(|b| *b as char));
    }
    out
}

/// Format a cell for display.
///
/// Formula cells show their computed value verbatim. Literal cells are
/// rendered by declared type: numbers with thousands separators and at most
/// three fraction digits, dates as `M/D/YYYY`, booleans as `TRUE`/`FALSE`.
pub fn display_value(cell: &Cell) -> String {
    let Some(value) = cell.value.as_deref().filter(|v| !v.is_empty()) else {
        return String::new();
    };

    if cell.has_formula() {
        return value.to_string();
    }

    match cell.kind {
        Some(DataType::Number) => match parse_number(value) {
            Some(n) if n.is_finite() => group_thousands(n),
            _ => value.to_string(),
        },
        Some(DataType::Date) => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => date.format("%-m/%-d/%Y").to_string(),
            Err(_) => value.to_string(),
        },
        Some(DataType::Boolean) => {
            if value.eq_ignore_ascii_case("true") { "TRUE" } else { "FALSE" }.to_string()
        }
        Some(DataType::Text) | None => value.to_string(),
    }
}

fn group_thousands(n: f64) -> String {
    if n.abs() >= FIXED_NOTATION_LIMIT {
        return format_number(n);
    }
    let fixed = to_fixed(n, 3);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if grouped.chars().all(|c| c == '0' || c == ',') && frac_part.is_empty() {
        ""
    } else {
        sign
    };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}
