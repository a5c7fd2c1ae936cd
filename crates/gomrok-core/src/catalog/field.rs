//! Field definitions and their compiled form.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::declaration::resolver::ResolverStrategy;
use crate::error::CatalogError;
use crate::normalize::canonicalize;

/// Target type of an extracted value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    #[serde(alias = "str")]
    String,
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "float")]
    Decimal,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Decimal => "decimal",
        }
    }
}

/// Semantic group a field is reported under in the record summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Identifiers,
    Financial,
    Goods,
    Administrative,
}

/// Field-specific post-processing applied after type conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CleanupRule {
    /// Keep digits only; the result must have exactly `count` digits.
    ExactDigits { count: usize },

    /// The value must have at least `count` digits.
    MinDigits { count: usize },

    /// Scrub free text of unrelated words and OCR noise.
    FreeText {
        #[serde(default = "default_blocklist")]
        blocklist: Vec<String>,
        #[serde(default = "default_min_length")]
        min_length: usize,
    },

    /// Numeric values below `min` are treated as misreads.
    MinMagnitude { min: Decimal },

    /// Upper-case text values.
    Uppercase,

    /// The value must fully match a regular expression.
    Format { pattern: String },
}

impl CleanupRule {
    pub fn name(&self) -> &'static str {
        match self {
            CleanupRule::ExactDigits { .. } => "exact_digits",
            CleanupRule::MinDigits { .. } => "min_digits",
            CleanupRule::FreeText { .. } => "free_text",
            CleanupRule::MinMagnitude { .. } => "min_magnitude",
            CleanupRule::Uppercase => "uppercase",
            CleanupRule::Format { .. } => "format",
        }
    }
}

/// Words from the declaration's legal boilerplate that bleed into the goods
/// description when OCR merges neighbouring cells.
pub fn default_blocklist() -> Vec<String> {
    ["حقوق", "برداخت", "قانون", "تنظیم", "اظهار", "مسنولیت", "تاریخ"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_min_length() -> usize {
    10
}

/// Static definition of one extractable field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Unique field identifier.
    pub name: String,

    /// Caption of the field on the declaration form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Candidate patterns, most trusted first.
    pub patterns: Vec<String>,

    #[serde(default)]
    pub value_type: ValueType,

    /// Closed set of canonical values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_values: Option<Vec<String>>,

    /// Raw value -> canonical value, applied before validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_mapping: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleanup: Vec<CleanupRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<FieldGroup>,

    /// Resolver override for this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ResolverStrategy>,
}

impl FieldSpec {
    /// Create a string field with the given patterns.
    pub fn new(name: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            value_type: ValueType::String,
            valid_values: None,
            value_mapping: None,
            cleanup: Vec::new(),
            group: None,
            strategy: None,
        }
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn with_valid_values(mut self, values: &[&str]) -> Self {
        self.valid_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_mapping(mut self, raw: &str, canonical: &str) -> Self {
        self.value_mapping
            .get_or_insert_with(BTreeMap::new)
            .insert(raw.to_string(), canonical.to_string());
        self
    }

    pub fn with_cleanup(mut self, rule: CleanupRule) -> Self {
        self.cleanup.push(rule);
        self
    }

    pub fn with_group(mut self, group: FieldGroup) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_strategy(mut self, strategy: ResolverStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

/// One catalog pattern after compilation.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Position in the field's pattern list.
    pub index: usize,
    /// Pattern source as written in the catalog.
    pub source: String,
    /// `None` if the pattern failed to compile; such patterns are skipped.
    pub regex: Option<Regex>,
}

/// A field spec with its patterns and format rules compiled.
///
/// Text compared against normalized input (valid values, mapping keys and
/// targets, free-text blocklists) is kept in canonical form next to the spec,
/// so a catalog may spell letters in either Arabic or Persian form.
#[derive(Debug, Clone)]
pub struct CompiledField {
    pub spec: FieldSpec,
    pub patterns: Vec<CompiledPattern>,
    pub(crate) valid_values: Option<Vec<String>>,
    pub(crate) value_mapping: Option<BTreeMap<String, String>>,
    pub(crate) cleanup: Vec<CleanupRule>,
    /// Compiled `format` rules, in cleanup order.
    pub(crate) formats: Vec<Regex>,
}

impl CompiledField {
    /// Compile a field spec.
    ///
    /// Broken candidate patterns are logged and skipped. A broken `format`
    /// rule is a catalog error.
    pub fn compile(spec: FieldSpec) -> Result<Self, CatalogError> {
        let patterns = spec
            .patterns
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let regex = RegexBuilder::new(&canonicalize(source))
                    .case_insensitive(true)
                    .multi_line(true)
                    .build();
                let regex = match regex {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        warn!(
                            "Skipping pattern #{} of field {}: {}",
                            index, spec.name, e
                        );
                        None
                    }
                };
                CompiledPattern {
                    index,
                    source: source.clone(),
                    regex,
                }
            })
            .collect();

        let mut formats = Vec::new();
        for rule in &spec.cleanup {
            if let CleanupRule::Format { pattern } = rule {
                let anchored = format!("^(?:{})$", canonicalize(pattern));
                let regex = Regex::new(&anchored).map_err(|e| CatalogError::InvalidRule {
                    field: spec.name.clone(),
                    reason: e.to_string(),
                })?;
                formats.push(regex);
            }
        }

        let valid_values = spec
            .valid_values
            .as_ref()
            .map(|values| values.iter().map(|v| canonicalize(v)).collect());
        let value_mapping = spec.value_mapping.as_ref().map(|mapping| {
            mapping
                .iter()
                .map(|(raw, canonical)| (canonicalize(raw.trim()), canonicalize(canonical)))
                .collect()
        });
        let cleanup = spec.cleanup.iter().map(canonical_rule).collect();

        Ok(Self {
            spec,
            patterns,
            valid_values,
            value_mapping,
            cleanup,
            formats,
        })
    }

    /// Allowed values in canonical form.
    pub fn valid_values(&self) -> Option<&[String]> {
        self.valid_values.as_deref()
    }

    /// Value mapping with canonical keys and targets.
    pub fn value_mapping(&self) -> Option<&BTreeMap<String, String>> {
        self.value_mapping.as_ref()
    }

    /// Cleanup rules in application order, blocklists canonicalized.
    pub fn cleanup(&self) -> &[CleanupRule] {
        &self.cleanup
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Number of patterns that compiled.
    pub fn active_patterns(&self) -> usize {
        self.patterns.iter().filter(|p| p.regex.is_some()).count()
    }

    /// Source of the pattern at `index`.
    pub fn pattern_source(&self, index: usize) -> Option<&str> {
        self.patterns.get(index).map(|p| p.source.as_str())
    }
}

fn canonical_rule(rule: &CleanupRule) -> CleanupRule {
    match rule {
        CleanupRule::FreeText {
            blocklist,
            min_length,
        } => CleanupRule::FreeText {
            blocklist: blocklist.iter().map(|w| canonicalize(w)).collect(),
            min_length: *min_length,
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_broken_pattern_is_skipped() {
        let spec = FieldSpec::new("code", &[r"(\d{8}", r"code:(\d{8})"]);
        let field = CompiledField::compile(spec).unwrap();

        assert_eq!(field.patterns.len(), 2);
        assert!(field.patterns[0].regex.is_none());
        assert!(field.patterns[1].regex.is_some());
        assert_eq!(field.active_patterns(), 1);
    }

    #[test]
    fn test_lookaround_is_skipped() {
        // Not supported by the regex engine; must not abort the field
        let spec = FieldSpec::new("code", &[r"(\d{8})(?=.*x)"]);
        let field = CompiledField::compile(spec).unwrap();
        assert_eq!(field.active_patterns(), 0);
    }

    #[test]
    fn test_patterns_are_canonicalized() {
        let spec = FieldSpec::new("code", &[r"كد\s*(\d{2})"]);
        let field = CompiledField::compile(spec).unwrap();
        let regex = field.patterns[0].regex.as_ref().unwrap();
        assert!(regex.is_match("کد 12"));
    }

    #[test]
    fn test_comparison_text_is_canonicalized() {
        let spec = FieldSpec::new("packaging", &[])
            .with_valid_values(&["كارتن", "EUR"])
            .with_mapping(" يورو ", "EUR")
            .with_cleanup(CleanupRule::FreeText {
                blocklist: vec!["قانون".to_string(), "مسئولية".to_string()],
                min_length: 10,
            });
        let field = CompiledField::compile(spec).unwrap();

        assert_eq!(
            field.valid_values(),
            Some(&["کارتن".to_string(), "EUR".to_string()][..])
        );
        assert_eq!(
            field.value_mapping().unwrap().get("یورو").map(String::as_str),
            Some("EUR")
        );
        assert_eq!(
            field.cleanup()[0],
            CleanupRule::FreeText {
                blocklist: vec!["قانون".to_string(), "مسئولیه".to_string()],
                min_length: 10,
            }
        );
        // The spec keeps the catalog's own spelling for export
        assert_eq!(field.spec.valid_values.as_ref().unwrap()[0], "كارتن");
    }

    #[test]
    fn test_invalid_format_rule_is_fatal() {
        let spec = FieldSpec::new("country", &[r"(\w+)"]).with_cleanup(CleanupRule::Format {
            pattern: "[A-Z".to_string(),
        });
        assert!(matches!(
            CompiledField::compile(spec),
            Err(CatalogError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_cleanup_rule_serde() {
        let json = r#"[
            {"rule": "exact_digits", "count": 8},
            {"rule": "free_text"},
            {"rule": "min_magnitude", "min": "1000"},
            {"rule": "uppercase"}
        ]"#;
        let rules: Vec<CleanupRule> = serde_json::from_str(json).unwrap();

        assert_eq!(rules[0], CleanupRule::ExactDigits { count: 8 });
        assert_eq!(
            rules[1],
            CleanupRule::FreeText {
                blocklist: default_blocklist(),
                min_length: 10
            }
        );
        assert_eq!(
            rules[2],
            CleanupRule::MinMagnitude {
                min: Decimal::from(1000)
            }
        );
        assert_eq!(rules[3], CleanupRule::Uppercase);
    }

    #[test]
    fn test_value_type_aliases() {
        let types: Vec<ValueType> = serde_json::from_str(r#"["int", "float", "string"]"#).unwrap();
        assert_eq!(
            types,
            vec![ValueType::Integer, ValueType::Decimal, ValueType::String]
        );
    }
}
