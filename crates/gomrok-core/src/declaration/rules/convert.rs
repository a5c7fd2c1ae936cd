//! Type coercion of raw matched substrings.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::catalog::ValueType;
use crate::error::ValidationError;
use crate::models::record::FieldValue;
use crate::normalize::normalize_digits;

/// Coerce a raw value to the field's value type.
pub fn coerce(raw: &str, value_type: ValueType) -> Result<FieldValue, ValidationError> {
    match value_type {
        ValueType::String => {
            let text = raw.trim();
            if text.is_empty() {
                return Err(ValidationError::Empty);
            }
            Ok(FieldValue::Text(text.to_string()))
        }
        ValueType::Integer => parse_integer(raw).map(FieldValue::Integer),
        ValueType::Decimal => {
            let digits = digits_only(raw);
            if digits.is_empty() {
                return Err(ValidationError::Empty);
            }
            parse_amount(raw)
                .map(FieldValue::Decimal)
                .ok_or_else(|| ValidationError::NotANumber(raw.trim().to_string()))
        }
    }
}

/// Digits of `s` after mapping Persian and Arabic-Indic digits to ASCII.
pub fn digits_only(s: &str) -> String {
    normalize_digits(s)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect()
}

/// Parse an integer, ignoring every non-digit character.
pub fn parse_integer(s: &str) -> Result<i64, ValidationError> {
    let digits = digits_only(s);
    if digits.is_empty() {
        return Err(ValidationError::Empty);
    }
    digits
        .parse::<i64>()
        .map_err(|_| ValidationError::OutOfRange(digits))
}

/// Parse an amount written with `.`/`,` separators.
///
/// When both separators appear, the last one is the decimal point. A lone
/// comma is a thousands separator only when exactly three digits follow it;
/// several commas always are. With dots only, the first dot is the decimal
/// point and later dots are dropped.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = normalize_digits(s)
        .chars()
        .map(|c| match c {
            '\u{066B}' => '.',
            '\u{066C}' => ',',
            _ => c,
        })
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if comma_groups_thousands(&cleaned) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, _) => cleaned,
    };

    let normalized = single_decimal_point(&normalized);
    let normalized = normalized.trim_end_matches('.');
    if !normalized.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let normalized = if normalized.starts_with('.') {
        format!("0{}", normalized)
    } else {
        normalized.to_string()
    };

    Decimal::from_str(&normalized).ok()
}

fn comma_groups_thousands(s: &str) -> bool {
    let mut parts = s.split(',');
    let head = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();
    match rest.as_slice() {
        [tail] => !head.is_empty() && tail.len() == 3,
        _ => true,
    }
}

/// Keep the first `.` and drop any later ones.
fn single_decimal_point(s: &str) -> String {
    let mut seen = false;
    s.chars()
        .filter(|&c| {
            if c != '.' {
                return true;
            }
            let keep = !seen;
            seen = true;
            keep
        })
        .collect()
}
