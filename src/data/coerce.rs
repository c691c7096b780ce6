//! Text -> number coercion for fields read from CSV.
//!
//! Source sheets write amounts like `"~1,234,567"`: grouping separators and a leading
//! approximation marker are stripped before parsing.

use super::{DataError, Result};
use crate::types::Year;

const APPROXIMATION_MARKER: char = '~';
const GROUPING_SEPARATOR: char = ',';

pub fn parse_amount(column: &str, text: &str) -> Result<u64> {
    let trimmed = text.trim();
    let unmarked = trimmed
        .strip_prefix(APPROXIMATION_MARKER)
        .unwrap_or(trimmed)
        .trim_start();
    let digits: String = unmarked
        .chars()
        .filter(|&c| c != GROUPING_SEPARATOR)
        .collect();

    let malformed = || DataError::MalformedAmount {
        column: column.to_string(),
        value: text.to_string(),
    };

    // u64::from_str accepts a leading '+', the sheets never carry one
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    digits.parse().map_err(|_| malformed())
}

pub fn parse_year(column: &str, text: &str) -> Result<Year> {
    text.parse().map_err(|_| DataError::InvalidYear {
        column: column.to_string(),
        value: text.to_string(),
    })
}

/// `1234567` -> `"1,234,567"`
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(GROUPING_SEPARATOR);
        }
        out.push(c);
    }
    out
}

/// Axis label form: `"$1,234,567"`
pub fn format_currency(amount: u64) -> String {
    format!("${}", format_amount(amount))
}
