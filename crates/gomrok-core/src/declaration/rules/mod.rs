//! Value conversion and validation rules.

pub mod cleanup;
pub mod convert;

pub use cleanup::{apply_rule, match_enumeration, scrub_free_text};
pub use convert::{coerce, digits_only, parse_amount, parse_integer};

use crate::catalog::{CleanupRule, CompiledField, ValueType};
use crate::error::ValidationError;
use crate::models::record::FieldValue;
use crate::normalize::canonicalize;

/// Turn a raw matched substring into a typed, validated value.
///
/// Steps, in order: value mapping, type coercion, enumeration, cleanup rules.
pub fn convert(raw: &str, field: &CompiledField) -> Result<FieldValue, ValidationError> {
    let spec = &field.spec;
    let trimmed = canonicalize(raw.trim());

    let mapped = field
        .value_mapping()
        .and_then(|mapping| mapping.get(&trimmed))
        .map(String::as_str)
        .unwrap_or(trimmed.as_str());

    let mut value = coerce(mapped, spec.value_type)?;

    // Digit counts on integer fields are taken before parsing drops leading zeros.
    let digits = (spec.value_type == ValueType::Integer).then(|| digits_only(mapped));

    if let Some(valid_values) = field.valid_values() {
        value = match value {
            FieldValue::Text(text) => FieldValue::Text(match_enumeration(&text, valid_values)?),
            other => {
                let rendered = other.to_string();
                if !valid_values.contains(&rendered) {
                    return Err(ValidationError::NotAllowed(rendered));
                }
                other
            }
        };
    }

    let mut formats = field.formats.iter();
    for rule in field.cleanup() {
        let format = match rule {
            CleanupRule::Format { .. } => formats.next(),
            _ => None,
        };
        let counts_digits = matches!(
            rule,
            CleanupRule::ExactDigits { .. } | CleanupRule::MinDigits { .. }
        );
        value = match (value, digits.as_deref()) {
            (FieldValue::Integer(n), Some(digits)) if counts_digits => {
                apply_rule(FieldValue::Text(digits.to_string()), rule, None)?;
                FieldValue::Integer(n)
            }
            (value, _) => apply_rule(value, rule, format)?,
        };
    }

    // Digit rules may leave the value in text form; keep the declared type.
    if spec.value_type == ValueType::Integer {
        if let FieldValue::Text(digits) = &value {
            return parse_integer(digits).map(FieldValue::Integer);
        }
    }

    Ok(value)
}
