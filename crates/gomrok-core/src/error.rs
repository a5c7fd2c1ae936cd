//! Error types for the gomrok-core library.

use thiserror::Error;

/// Main error type for the gomrok library.
#[derive(Error, Debug)]
pub enum GomrokError {
    /// Pattern catalog could not be loaded.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON input (OCR page or configuration).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while loading or compiling a pattern catalog.
///
/// These are the only fatal errors of the engine; everything that happens
/// while matching a page degrades to a missing field instead.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog document is not valid JSON or has the wrong shape.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// The catalog file could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// A field has an empty name.
    #[error("field #{0} has an empty name")]
    EmptyName(usize),

    /// Two fields share the same name.
    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    /// A cleanup rule is malformed.
    #[error("invalid cleanup rule for {field}: {reason}")]
    InvalidRule { field: String, reason: String },
}

/// Reasons a matched raw value is rejected by conversion or cleanup.
///
/// A rejection is an expected outcome on noisy OCR text, not a failure of the
/// engine: the field is simply reported as not extracted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing left after stripping.
    #[error("value is empty after cleanup")]
    Empty,

    /// The value could not be parsed as a number.
    #[error("not a number: {0}")]
    NotANumber(String),

    /// The number does not fit the target type.
    #[error("number out of range: {0}")]
    OutOfRange(String),

    /// Wrong number of digits for a fixed-width identifier.
    #[error("expected exactly {expected} digits, found {found}")]
    DigitCount { expected: usize, found: usize },

    /// Too few digits for a minimum-width amount.
    #[error("expected at least {min} digits, found {found}")]
    TooFewDigits { min: usize, found: usize },

    /// The value is not one of the allowed values.
    #[error("not an allowed value: {0}")]
    NotAllowed(String),

    /// Free text became too short after cleanup.
    #[error("text too short after cleanup ({found} < {min} characters)")]
    TooShort { min: usize, found: usize },

    /// A numeric value is implausibly small.
    #[error("value {value} is below the minimum {min}")]
    BelowMinimum { value: String, min: String },

    /// The value does not match the required format.
    #[error("value does not match format {0}")]
    FormatMismatch(String),

    /// A rule was applied to a value of the wrong type.
    #[error("rule {rule} does not apply to {value_type} values")]
    TypeMismatch {
        rule: &'static str,
        value_type: &'static str,
    },
}

/// Result type for the gomrok library.
pub type Result<T> = std::result::Result<T, GomrokError>;
