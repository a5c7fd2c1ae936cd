//! Core library for customs declaration field extraction.
//!
//! This crate provides:
//! - Normalization of OCR'd Persian/Arabic text
//! - A data-driven pattern catalog with an embedded default
//! - Candidate collection and priority/voting resolution
//! - Typed value conversion and per-field cleanup rules
//! - Page records with statistics, semantic summary and page type

pub mod catalog;
pub mod declaration;
pub mod error;
pub mod models;
pub mod normalize;
pub mod ocr;

pub use catalog::{CatalogDefinition, CompiledField, FieldGroup, FieldSpec, PatternCatalog, ValueType};
pub use declaration::{
    DeclarationExtractor, PageClassifier, PageType, ResolverStrategy, ValidationReport,
    extract_all, validate_record,
};
pub use error::{CatalogError, GomrokError, Result, ValidationError};
pub use models::config::{ExtractionConfig, GomrokConfig};
pub use models::record::{ExtractionRecord, FieldOutcome, FieldResult, FieldValue};
pub use normalize::{normalize, token_stream};
pub use ocr::OcrPage;
