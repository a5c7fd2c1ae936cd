//! Configuration structures for the extraction engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::PatternCatalog;
use crate::declaration::resolver::ResolverStrategy;
use crate::error::{CatalogError, GomrokError, Result};

/// Main configuration for gomrok.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GomrokConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Pattern catalog selection.
    pub catalog: CatalogConfig,

    /// Page-type classification.
    pub page: PageConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Resolver used for fields without a per-field override.
    pub strategy: ResolverStrategy,

    /// Confidence curve of the priority resolver.
    pub priority: PriorityConfig,

    /// Fields above this confidence count as high-confidence.
    pub high_confidence_threshold: f64,

    /// When the winning candidate is rejected, try the next one.
    pub fall_through_on_rejection: bool,

    /// Number of characters of text kept in the record.
    pub raw_text_excerpt_chars: usize,

    /// Extracted fields below this confidence are flagged by validation.
    pub low_confidence_warning: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategy: ResolverStrategy::Priority,
            priority: PriorityConfig::default(),
            high_confidence_threshold: 0.7,
            fall_through_on_rejection: false,
            raw_text_excerpt_chars: 500,
            low_confidence_warning: 0.3,
        }
    }
}

/// Priority resolver constants: `max(floor, base - index * penalty)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityConfig {
    pub base: f64,
    pub penalty: f64,
    pub floor: f64,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            base: 1.0,
            penalty: 0.15,
            floor: 0.1,
        }
    }
}

/// Pattern catalog selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog file to use instead of the built-in one.
    pub path: Option<PathBuf>,
}

impl CatalogConfig {
    /// Load the configured catalog, falling back to the built-in one.
    pub fn load(&self) -> std::result::Result<PatternCatalog, CatalogError> {
        match &self.path {
            Some(path) => PatternCatalog::from_file(path),
            None => PatternCatalog::builtin(),
        }
    }
}

/// Page-type classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Structural marker counted on the page.
    pub marker_pattern: String,

    /// Marker count from which a page is a first page.
    pub first_page_min_markers: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            marker_pattern: r"\b31\s+".to_string(),
            first_page_min_markers: 4,
        }
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of pages processed concurrently.
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

impl GomrokConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let priority = &self.extraction.priority;
        if !(0.0..=1.0).contains(&priority.floor) || !(0.0..=1.0).contains(&priority.base) {
            return Err(GomrokError::Config(
                "priority base and floor must be within [0, 1]".to_string(),
            ));
        }
        if priority.penalty < 0.0 {
            return Err(GomrokError::Config(
                "priority penalty must not be negative".to_string(),
            ));
        }
        if self.page.first_page_min_markers < 2 {
            return Err(GomrokError::Config(
                "page.first_page_min_markers must be at least 2".to_string(),
            ));
        }
        if self.batch.workers == 0 {
            return Err(GomrokError::Config(
                "batch.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = GomrokConfig::default();
        assert_eq!(config.extraction.strategy, ResolverStrategy::Priority);
        assert_eq!(config.extraction.priority, PriorityConfig::default());
        assert_eq!(config.extraction.high_confidence_threshold, 0.7);
        assert!(!config.extraction.fall_through_on_rejection);
        assert_eq!(config.page.first_page_min_markers, 4);
        assert_eq!(config.batch.workers, 4);
        assert!(config.catalog.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GomrokConfig =
            serde_json::from_str(r#"{"extraction": {"strategy": "voting"}}"#).unwrap();
        assert_eq!(config.extraction.strategy, ResolverStrategy::Voting);
        assert_eq!(config.extraction.raw_text_excerpt_chars, 500);
        assert_eq!(config.page.marker_pattern, r"\b31\s+");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = GomrokConfig::default();
        config.extraction.fall_through_on_rejection = true;
        config.batch.workers = 2;
        config.save(&path).unwrap();

        let loaded = GomrokConfig::from_file(&path).unwrap();
        assert!(loaded.extraction.fall_through_on_rejection);
        assert_eq!(loaded.batch.workers, 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = GomrokConfig::default();
        config.batch.workers = 0;
        assert!(matches!(config.validate(), Err(GomrokError::Config(_))));

        let mut config = GomrokConfig::default();
        config.extraction.priority.floor = 1.5;
        assert!(matches!(config.validate(), Err(GomrokError::Config(_))));
    }

    #[test]
    fn test_catalog_config_builtin() {
        let catalog = CatalogConfig::default().load().unwrap();
        assert!(catalog.field("item_code").is_some());
    }
}
