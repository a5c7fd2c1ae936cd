//! Extraction record: the output of one page extraction.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::catalog::FieldGroup;
use crate::declaration::page::PageType;
use crate::declaration::resolver::ResolverStrategy;
use crate::error::ValidationError;

/// A typed, validated field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Decimal(Decimal),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Decimal(d) => Some(*d),
            FieldValue::Integer(n) => Some(Decimal::from(*n)),
            FieldValue::Text(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Integer(_) => "integer",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

fn serialize_reason<S: Serializer>(reason: &ValidationError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(reason)
}

/// What happened to one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldOutcome {
    /// A candidate was found and passed validation.
    Extracted { value: FieldValue },
    /// A candidate was found but failed validation.
    Rejected {
        #[serde(serialize_with = "serialize_reason")]
        reason: ValidationError,
    },
    /// No pattern produced a candidate.
    NoMatch,
}

/// Per-field extraction result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldResult {
    pub field: String,
    #[serde(flatten)]
    pub outcome: FieldOutcome,
    /// Resolver confidence; 0 unless the value was extracted.
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
    /// The raw substring the decision was made on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<String>,
    /// Resolver that ranked the candidates; absent when nothing matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ResolverStrategy>,
}

impl FieldResult {
    pub fn no_match(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            outcome: FieldOutcome::NoMatch,
            confidence: 0.0,
            matched_pattern: None,
            raw_value: None,
            strategy: None,
        }
    }

    pub fn value(&self) -> Option<&FieldValue> {
        match &self.outcome {
            FieldOutcome::Extracted { value } => Some(value),
            _ => None,
        }
    }

    pub fn is_extracted(&self) -> bool {
        matches!(self.outcome, FieldOutcome::Extracted { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.outcome, FieldOutcome::Rejected { .. })
    }

    /// Short status label for tabular output.
    pub fn status(&self) -> &'static str {
        match self.outcome {
            FieldOutcome::Extracted { .. } => "extracted",
            FieldOutcome::Rejected { .. } => "rejected",
            FieldOutcome::NoMatch => "no_match",
        }
    }
}

/// Aggregate statistics for a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionStats {
    pub total_fields: usize,
    pub extracted_fields: usize,
    pub failed_fields: usize,
    pub rejected_fields: usize,
    pub high_confidence_fields: usize,
    /// Percentage of catalog fields extracted (0-100).
    pub success_rate: f64,
    pub elapsed_ms: u64,
}

impl ExtractionStats {
    /// Compute statistics over field results.
    pub fn from_results(results: &[FieldResult], high_confidence_threshold: f64) -> Self {
        let total_fields = results.len();
        let extracted_fields = results.iter().filter(|r| r.is_extracted()).count();
        let rejected_fields = results.iter().filter(|r| r.is_rejected()).count();
        let high_confidence_fields = results
            .iter()
            .filter(|r| r.is_extracted() && r.confidence > high_confidence_threshold)
            .count();
        let success_rate = if total_fields == 0 {
            0.0
        } else {
            extracted_fields as f64 * 100.0 / total_fields as f64
        };

        Self {
            total_fields,
            extracted_fields,
            failed_fields: total_fields - extracted_fields,
            rejected_fields,
            high_confidence_fields,
            success_rate,
            elapsed_ms: 0,
        }
    }
}

/// Extracted values bucketed by semantic group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SemanticSummary {
    pub identifiers: BTreeMap<String, FieldValue>,
    pub financial: BTreeMap<String, FieldValue>,
    pub goods: BTreeMap<String, FieldValue>,
    pub administrative: BTreeMap<String, FieldValue>,
}

impl SemanticSummary {
    pub fn bucket(&self, group: FieldGroup) -> &BTreeMap<String, FieldValue> {
        match group {
            FieldGroup::Identifiers => &self.identifiers,
            FieldGroup::Financial => &self.financial,
            FieldGroup::Goods => &self.goods,
            FieldGroup::Administrative => &self.administrative,
        }
    }

    pub fn bucket_mut(&mut self, group: FieldGroup) -> &mut BTreeMap<String, FieldValue> {
        match group {
            FieldGroup::Identifiers => &mut self.identifiers,
            FieldGroup::Financial => &mut self.financial,
            FieldGroup::Goods => &mut self.goods,
            FieldGroup::Administrative => &mut self.administrative,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
            && self.financial.is_empty()
            && self.goods.is_empty()
            && self.administrative.is_empty()
    }
}

/// Metadata about the processed page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentInfo {
    pub document_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    pub processed_at: DateTime<Utc>,
    pub extraction_method: String,
    pub catalog_version: String,
    /// Strategy for fields without their own override.
    pub default_strategy: ResolverStrategy,
    pub page_type: PageType,
}

/// Complete output of one page extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRecord {
    pub document_info: DocumentInfo,
    /// Leading excerpt of the normalized text.
    pub raw_text: String,
    /// One result per catalog field, in catalog order.
    pub fields: Vec<FieldResult>,
    pub stats: ExtractionStats,
    pub summary: SemanticSummary,
}

impl ExtractionRecord {
    pub fn field(&self, name: &str) -> Option<&FieldResult> {
        self.fields.iter().find(|f| f.field == name)
    }

    /// Extracted value of a field, if any.
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.field(name).and_then(|f| f.value())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Leading `max_chars` characters of `text`, with `...` appended when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
