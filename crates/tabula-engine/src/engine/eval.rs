//! Formula evaluation entry points.
//!
//! A formula is `=NAME(args)` where `NAME` is one of the catalogue functions
//! in [`FunctionKind`](crate::engine::FunctionKind). Failures come back as
//! [`ErrorToken`]s, which are stored as the cell's value like any result.

use thiserror::Error;

use super::cell::Grid;

/// Sentinel strings standing in for a failed computation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorToken {
    /// Evaluation faulted: bad argument count, non-numeric operand, oversize range.
    #[error("#ERROR!")]
    Error,
    /// The function name is not in the catalogue.
    #[error("#INVALID!")]
    Invalid,
    /// An aggregate had nothing to summarize.
    #[error("#N/A")]
    NotAvailable,
    /// AVERAGE over no numeric values.
    #[error("#DIV/0!")]
    DivByZero,
    /// The cell sits on a dependency cycle (full recalculation only).
    #[error("#CIRCULAR!")]
    Circular,
}

impl ErrorToken {
    pub const ALL: [ErrorToken; 5] = [
        ErrorToken::Error,
        ErrorToken::Invalid,
        ErrorToken::NotAvailable,
        ErrorToken::DivByZero,
        ErrorToken::Circular,
    ];

    /// Recognize a stored cell value as an error token.
    pub fn from_value(value: &str) -> Option<ErrorToken> {
        Self::ALL.into_iter().find(|t| t.to_string() == value)
    }
}

pub type FormulaResult = Result<String, ErrorToken>;

/// Read access to cell values during evaluation.
pub trait ResolveCell {
    fn resolve(&self, id: &str) -> Option<String>;
}

impl ResolveCell for Grid {
    fn resolve(&self, id: &str) -> Option<String> {
        self.get(id).and_then(|cell| cell.value.clone())
    }
}

impl<F> ResolveCell for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, id: &str) -> Option<String> {
        self(id)
    }
}

/// Evaluate a formula. Text not starting with `=` is returned unchanged.
pub fn evaluate_formula<R: ResolveCell + ?Sized>(formula: &str, resolver: &R) -> FormulaResult {
    let Some(expr) = formula.strip_prefix('=') else {
        return Ok(formula.to_string());
    };
    let expr = expr.trim();

    let Some(open) = expr.find('(') else {
        return Err(ErrorToken::Invalid);
    };
    let kind = expr[..open]
        .parse::<crate::builtins::FunctionKind>()
        .map_err(|_| ErrorToken::Invalid)?;

    let args = match expr.rfind(')') {
        Some(close) if close > open => &expr[open + 1..close],
        _ => "",
    };

    crate::builtins::call(kind, args, resolver)
}

/// Evaluate a formula, flattening error tokens into their text.
pub fn evaluate<R: ResolveCell + ?Sized>(formula: &str, resolver: &R) -> String {
    match evaluate_formula(formula, resolver) {
        Ok(value) => value,
        Err(token) => token.to_string(),
    }
}
