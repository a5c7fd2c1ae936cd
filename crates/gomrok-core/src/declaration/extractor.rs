//! Page-level aggregation: run every catalog field and build the record.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::catalog::{CompiledField, PatternCatalog};
use crate::error::Result;
use crate::models::config::{ExtractionConfig, GomrokConfig};
use crate::models::record::{
    DocumentInfo, ExtractionRecord, ExtractionStats, FieldOutcome, FieldResult, SemanticSummary,
    excerpt,
};
use crate::normalize::normalize;
use crate::ocr::OcrPage;

use super::collector::collect;
use super::page::PageClassifier;
use super::resolver::{PriorityResolver, Resolver, ResolverStrategy, VotingResolver};
use super::rules::convert;

const DOCUMENT_TYPE: &str = "customs_declaration";
const EXTRACTION_METHOD: &str = "pattern_catalog";

/// Customs declaration extractor.
///
/// Holds a shared, read-only catalog; one instance can serve any number of
/// pages and threads.
#[derive(Debug, Clone)]
pub struct DeclarationExtractor {
    catalog: Arc<PatternCatalog>,
    config: ExtractionConfig,
    priority: PriorityResolver,
    voting: VotingResolver,
    classifier: PageClassifier,
}

impl DeclarationExtractor {
    /// Create an extractor over `catalog`.
    pub fn new(catalog: Arc<PatternCatalog>, config: ExtractionConfig) -> Self {
        Self {
            priority: PriorityResolver::from_config(&config.priority),
            voting: VotingResolver::new(),
            classifier: PageClassifier::default(),
            catalog,
            config,
        }
    }

    /// Build an extractor from a full configuration, loading its catalog.
    pub fn from_config(config: &GomrokConfig) -> Result<Self> {
        let catalog = Arc::new(config.catalog.load()?);
        let classifier = PageClassifier::new(&config.page)?;
        Ok(Self::new(catalog, config.extraction.clone()).with_page_classifier(classifier))
    }

    pub fn with_page_classifier(mut self, classifier: PageClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the default resolver strategy.
    pub fn with_strategy(mut self, strategy: ResolverStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Try lower-ranked candidates when the winner fails validation.
    pub fn with_fall_through(mut self, enabled: bool) -> Self {
        self.config.fall_through_on_rejection = enabled;
        self
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Strategy in effect for `field`: its own override, else the default.
    pub fn strategy_for(&self, field: &CompiledField) -> ResolverStrategy {
        field.spec.strategy.unwrap_or(self.config.strategy)
    }

    fn resolver(&self, strategy: ResolverStrategy) -> &dyn Resolver {
        match strategy {
            ResolverStrategy::Priority => &self.priority,
            ResolverStrategy::Voting => &self.voting,
        }
    }

    /// Extract one field from already normalized text.
    pub fn extract_field(&self, field: &CompiledField, normalized: &str) -> FieldResult {
        let strategy = self.strategy_for(field);
        let candidates = collect(field, normalized);
        let ranked = self.resolver(strategy).rank(field, &candidates);

        let mut rejection = None;
        for resolution in &ranked {
            match convert(&resolution.raw_value, field) {
                Ok(value) => {
                    debug!(
                        "{} = {} (confidence {:.2}, pattern #{})",
                        field.name(),
                        value,
                        resolution.confidence,
                        resolution.pattern_index
                    );
                    return FieldResult {
                        field: field.name().to_string(),
                        outcome: FieldOutcome::Extracted { value },
                        confidence: resolution.confidence,
                        matched_pattern: Some(resolution.matched_pattern.clone()),
                        raw_value: Some(resolution.raw_value.clone()),
                        strategy: Some(strategy),
                    };
                }
                Err(reason) => {
                    debug!(
                        "{}: rejected {:?}: {}",
                        field.name(),
                        resolution.raw_value,
                        reason
                    );
                    rejection.get_or_insert((resolution, reason));
                    if !self.config.fall_through_on_rejection {
                        break;
                    }
                }
            }
        }

        match rejection {
            Some((resolution, reason)) => FieldResult {
                field: field.name().to_string(),
                outcome: FieldOutcome::Rejected { reason },
                confidence: 0.0,
                matched_pattern: Some(resolution.matched_pattern.clone()),
                raw_value: Some(resolution.raw_value.clone()),
                strategy: Some(strategy),
            },
            None => {
                debug!("{}: no match", field.name());
                FieldResult::no_match(field.name())
            }
        }
    }

    /// Extract every catalog field from a page of text.
    pub fn extract_all(&self, text: &str) -> ExtractionRecord {
        self.extract_text(text, None)
    }

    /// Extract a numbered page of a multi-page declaration.
    pub fn extract_page(&self, text: &str, page_number: u32) -> ExtractionRecord {
        self.extract_text(text, Some(page_number))
    }

    /// Extract from an OCR page document.
    pub fn extract_ocr(&self, page: &OcrPage) -> ExtractionRecord {
        debug!(
            "OCR page: {} chars, confidence {:.1}",
            page.text.chars().count(),
            page.confidence
        );
        self.extract_text(&page.text, page.page_number)
    }

    fn extract_text(&self, text: &str, page_number: Option<u32>) -> ExtractionRecord {
        let start = Instant::now();
        let normalized = normalize(text);

        let fields: Vec<FieldResult> = self
            .catalog
            .fields()
            .iter()
            .map(|field| self.extract_field(field, &normalized))
            .collect();

        let mut summary = SemanticSummary::default();
        for (field, result) in self.catalog.fields().iter().zip(&fields) {
            if let (Some(group), Some(value)) = (field.spec.group, result.value()) {
                summary
                    .bucket_mut(group)
                    .insert(result.field.clone(), value.clone());
            }
        }

        let page_type = self.classifier.classify(&normalized);

        let mut stats = ExtractionStats::from_results(&fields, self.config.high_confidence_threshold);
        stats.elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            "Extracted {}/{} fields ({:.1}%) from {} page in {}ms",
            stats.extracted_fields, stats.total_fields, stats.success_rate, page_type, stats.elapsed_ms
        );

        ExtractionRecord {
            document_info: DocumentInfo {
                document_type: DOCUMENT_TYPE.to_string(),
                page_number,
                processed_at: Utc::now(),
                extraction_method: EXTRACTION_METHOD.to_string(),
                catalog_version: self.catalog.version().to_string(),
                default_strategy: self.config.strategy,
                page_type,
            },
            raw_text: excerpt(&normalized, self.config.raw_text_excerpt_chars),
            fields,
            stats,
            summary,
        }
    }
}

/// Extract every field of `catalog` from `text` with the default configuration.
pub fn extract_all(text: &str, catalog: &PatternCatalog) -> ExtractionRecord {
    DeclarationExtractor::new(Arc::new(catalog.clone()), ExtractionConfig::default())
        .extract_all(text)
}
