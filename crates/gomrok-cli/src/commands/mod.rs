//! CLI subcommands.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use gomrok_core::declaration::PageClassifier;
use gomrok_core::{DeclarationExtractor, GomrokConfig, PatternCatalog};

/// Load the configuration from `--config`, the user config file, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<GomrokConfig> {
    if let Some(path) = config_path {
        return Ok(GomrokConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using configuration from {}", default_path.display());
        Ok(GomrokConfig::from_file(&default_path)?)
    } else {
        Ok(GomrokConfig::default())
    }
}

/// Load the catalog, preferring an explicit path over the configured one.
pub fn load_catalog(config: &GomrokConfig, catalog: Option<&PathBuf>) -> anyhow::Result<PatternCatalog> {
    let catalog = match catalog {
        Some(path) => PatternCatalog::from_file(path)?,
        None => config.catalog.load()?,
    };
    Ok(catalog)
}

/// Build an extractor from the configuration.
pub fn build_extractor(
    config: &GomrokConfig,
    catalog: PatternCatalog,
) -> anyhow::Result<DeclarationExtractor> {
    let classifier = PageClassifier::new(&config.page)?;
    Ok(DeclarationExtractor::new(Arc::new(catalog), config.extraction.clone())
        .with_page_classifier(classifier))
}
