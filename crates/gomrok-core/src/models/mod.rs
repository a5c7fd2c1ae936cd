//! Data models: extraction records and configuration.

pub mod config;
pub mod record;

pub use config::{BatchConfig, CatalogConfig, ExtractionConfig, GomrokConfig, PageConfig, PriorityConfig};
pub use record::{
    DocumentInfo, ExtractionRecord, ExtractionStats, FieldOutcome, FieldResult, FieldValue,
    SemanticSummary,
};
