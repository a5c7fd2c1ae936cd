//! Post-extraction review of a record.

use serde::Serialize;

use crate::models::record::{ExtractionRecord, FieldOutcome};

/// A field whose candidate failed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidField {
    pub field: String,
    pub raw_value: Option<String>,
    pub reason: String,
}

/// Outcome of reviewing an extraction record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// True when no field was rejected.
    pub is_valid: bool,
    pub valid_fields: Vec<String>,
    pub invalid_fields: Vec<InvalidField>,
    pub missing_fields: Vec<String>,
    pub warnings: Vec<String>,
}

/// Review a record: list rejected and missing fields and flag extracted
/// fields whose confidence is below `low_confidence_threshold`.
pub fn validate_record(record: &ExtractionRecord, low_confidence_threshold: f64) -> ValidationReport {
    let mut report = ValidationReport::default();

    for result in &record.fields {
        match &result.outcome {
            FieldOutcome::Extracted { .. } => {
                if result.confidence < low_confidence_threshold {
                    report.warnings.push(format!(
                        "{}: low confidence ({:.2})",
                        result.field, result.confidence
                    ));
                }
                report.valid_fields.push(result.field.clone());
            }
            FieldOutcome::Rejected { reason } => report.invalid_fields.push(InvalidField {
                field: result.field.clone(),
                raw_value: result.raw_value.clone(),
                reason: reason.to_string(),
            }),
            FieldOutcome::NoMatch => report.missing_fields.push(result.field.clone()),
        }
    }

    report.is_valid = report.invalid_fields.is_empty();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::models::record::{FieldResult, FieldValue};
    use crate::{ExtractionConfig, PatternCatalog};
    use pretty_assertions::assert_eq;

    fn record_with(fields: Vec<FieldResult>) -> ExtractionRecord {
        let catalog = PatternCatalog::from_fields("t", Vec::new()).unwrap();
        let mut record = crate::DeclarationExtractor::new(
            std::sync::Arc::new(catalog),
            ExtractionConfig::default(),
        )
        .extract_all("");
        record.fields = fields;
        record
    }

    #[test]
    fn test_report() {
        let record = record_with(vec![
            FieldResult {
                outcome: FieldOutcome::Extracted {
                    value: FieldValue::Integer(1),
                },
                confidence: 1.0,
                ..FieldResult::no_match("good")
            },
            FieldResult {
                outcome: FieldOutcome::Extracted {
                    value: FieldValue::Integer(2),
                },
                confidence: 0.1,
                ..FieldResult::no_match("weak")
            },
            FieldResult {
                outcome: FieldOutcome::Rejected {
                    reason: ValidationError::Empty,
                },
                raw_value: Some("--".to_string()),
                ..FieldResult::no_match("bad")
            },
            FieldResult::no_match("absent"),
        ]);

        let report = validate_record(&record, 0.3);

        assert!(!report.is_valid);
        assert_eq!(report.valid_fields, vec!["good", "weak"]);
        assert_eq!(report.missing_fields, vec!["absent"]);
        assert_eq!(report.invalid_fields.len(), 1);
        assert_eq!(report.invalid_fields[0].field, "bad");
        assert_eq!(report.invalid_fields[0].raw_value.as_deref(), Some("--"));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("weak"));
    }

    #[test]
    fn test_empty_record_is_valid() {
        let report = validate_record(&record_with(Vec::new()), 0.3);
        assert!(report.is_valid);
        assert!(report.warnings.is_empty());
    }
}
