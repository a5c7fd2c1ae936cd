//! Enumeration checks and per-field cleanup rules.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::catalog::CleanupRule;
use crate::error::ValidationError;
use crate::models::record::FieldValue;

use super::convert::digits_only;

lazy_static! {
    // Long digit runs are OCR bleed from neighbouring numeric cells.
    static ref DIGIT_RUN: Regex = Regex::new(r"\d{5,}").unwrap();

    static ref PUNCT_RUN: Regex = Regex::new(r"[:.+\-]{2,}").unwrap();
}

/// Resolve a value against a closed set of allowed values.
///
/// An exact match wins; otherwise the first allowed value contained in the
/// text (case-insensitively) is returned in its canonical spelling.
pub fn match_enumeration(value: &str, valid_values: &[String]) -> Result<String, ValidationError> {
    if valid_values.iter().any(|v| v == value) {
        return Ok(value.to_string());
    }

    let lowered = value.to_lowercase();
    valid_values
        .iter()
        .find(|v| !v.is_empty() && lowered.contains(&v.to_lowercase()))
        .cloned()
        .ok_or_else(|| ValidationError::NotAllowed(value.to_string()))
}

/// Scrub free text: drop blocklisted words, digit runs and punctuation runs.
pub fn scrub_free_text(
    text: &str,
    blocklist: &[String],
    min_length: usize,
) -> Result<String, ValidationError> {
    let mut cleaned = text.to_string();
    for word in blocklist.iter().filter(|w| !w.is_empty()) {
        cleaned = cleaned.replace(word.as_str(), " ");
    }
    let cleaned = DIGIT_RUN.replace_all(&cleaned, "");
    let cleaned = PUNCT_RUN.replace_all(&cleaned, " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    let found = cleaned.chars().count();
    if found < min_length {
        return Err(ValidationError::TooShort {
            min: min_length,
            found,
        });
    }
    Ok(cleaned)
}

fn digit_count(value: &FieldValue, rule: &CleanupRule) -> Result<(usize, Option<String>), ValidationError> {
    match value {
        FieldValue::Text(s) => {
            let digits = digits_only(s);
            Ok((digits.len(), Some(digits)))
        }
        FieldValue::Integer(n) => Ok((n.unsigned_abs().to_string().len(), None)),
        FieldValue::Decimal(_) => Err(ValidationError::TypeMismatch {
            rule: rule.name(),
            value_type: value.type_name(),
        }),
    }
}

/// Apply one cleanup rule.
///
/// `format` rules need their compiled regex, passed in as `format`.
pub fn apply_rule(
    value: FieldValue,
    rule: &CleanupRule,
    format: Option<&Regex>,
) -> Result<FieldValue, ValidationError> {
    match rule {
        CleanupRule::ExactDigits { count } => {
            let (found, digits) = digit_count(&value, rule)?;
            if found != *count {
                return Err(ValidationError::DigitCount {
                    expected: *count,
                    found,
                });
            }
            Ok(digits.map(FieldValue::Text).unwrap_or(value))
        }
        CleanupRule::MinDigits { count } => {
            let (found, digits) = digit_count(&value, rule)?;
            if found < *count {
                return Err(ValidationError::TooFewDigits { min: *count, found });
            }
            Ok(digits.map(FieldValue::Text).unwrap_or(value))
        }
        CleanupRule::FreeText {
            blocklist,
            min_length,
        } => match value {
            FieldValue::Text(text) => {
                scrub_free_text(&text, blocklist, *min_length).map(FieldValue::Text)
            }
            other => Err(ValidationError::TypeMismatch {
                rule: rule.name(),
                value_type: other.type_name(),
            }),
        },
        CleanupRule::MinMagnitude { min } => {
            let number: Decimal = value.as_decimal().ok_or(ValidationError::TypeMismatch {
                rule: rule.name(),
                value_type: value.type_name(),
            })?;
            if number < *min {
                return Err(ValidationError::BelowMinimum {
                    value: number.to_string(),
                    min: min.to_string(),
                });
            }
            Ok(value)
        }
        CleanupRule::Uppercase => match value {
            FieldValue::Text(text) => Ok(FieldValue::Text(text.to_uppercase())),
            other => Ok(other),
        },
        CleanupRule::Format { pattern } => {
            let rendered = value.to_string();
            match format {
                Some(regex) if regex.is_match(&rendered) => Ok(value),
                _ => Err(ValidationError::FormatMismatch(pattern.clone())),
            }
        }
    }
}
