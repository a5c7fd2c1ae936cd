//! Pattern catalog: the per-field pattern tables that drive extraction.
//!
//! A catalog is configuration data, not code. It is loaded once, compiled
//! once, and then shared read-only (behind an `Arc`) by every extraction.

mod embedded;
mod field;

pub use embedded::{BUILTIN_CATALOG, builtin_definition};
pub use field::{
    CleanupRule, CompiledField, CompiledPattern, FieldGroup, FieldSpec, ValueType,
    default_blocklist, default_min_length,
};

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CatalogError;

/// On-disk shape of a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDefinition {
    /// Catalog version, reported in every extraction record.
    pub version: String,

    /// Field definitions in reporting order.
    pub fields: Vec<FieldSpec>,
}

impl CatalogDefinition {
    /// Parse a catalog definition from JSON.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the definition as pretty JSON.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A compiled, immutable pattern catalog.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    version: String,
    fields: Vec<CompiledField>,
}

impl PatternCatalog {
    /// Compile a catalog definition.
    pub fn new(definition: CatalogDefinition) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(definition.fields.len());

        for (i, spec) in definition.fields.into_iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(i));
            }
            if !seen.insert(spec.name.clone()) {
                return Err(CatalogError::DuplicateField(spec.name));
            }
            let field = CompiledField::compile(spec)?;
            check_mapping(&field);
            debug!(
                "Compiled field {} ({}/{} patterns active)",
                field.name(),
                field.active_patterns(),
                field.patterns.len()
            );
            fields.push(field);
        }

        info!(
            "Loaded pattern catalog v{} with {} fields",
            definition.version,
            fields.len()
        );

        Ok(Self {
            version: definition.version,
            fields,
        })
    }

    /// Load a catalog from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::new(CatalogDefinition::from_json(json)?)
    }

    /// Load a catalog from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// The authoritative catalog shipped with the library.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(builtin_definition()?)
    }

    /// Build a catalog directly from field specs.
    pub fn from_fields(version: impl Into<String>, fields: Vec<FieldSpec>) -> Result<Self, CatalogError> {
        Self::new(CatalogDefinition {
            version: version.into(),
            fields,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Recover the definition this catalog was compiled from.
    pub fn definition(&self) -> CatalogDefinition {
        CatalogDefinition {
            version: self.version.clone(),
            fields: self.fields.iter().map(|f| f.spec.clone()).collect(),
        }
    }
}

/// Warn about mapping targets that can never pass enumeration.
fn check_mapping(field: &CompiledField) {
    if let (Some(mapping), Some(valid)) = (field.value_mapping(), field.valid_values()) {
        for target in mapping.values() {
            if !valid.contains(target) {
                warn!(
                    "Field {} maps to {:?}, which is not one of its valid values",
                    field.name(),
                    target
                );
            }
        }
    }
}
