//! Default catalog embedded in the binary.
//!
//! The catalog is authored as JSON so it can evolve (or be replaced by a file
//! passed on the command line) without touching the engine.

use super::CatalogDefinition;
use crate::error::CatalogError;

/// Authoritative customs declaration catalog.
pub static BUILTIN_CATALOG: &str = include_str!("../../assets/catalog.json");

/// Parse the embedded catalog definition.
pub fn builtin_definition() -> Result<CatalogDefinition, CatalogError> {
    CatalogDefinition::from_json(BUILTIN_CATALOG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldGroup, PatternCatalog};

    #[test]
    fn test_builtin_catalog_compiles_every_pattern() {
        let catalog = PatternCatalog::builtin().unwrap();
        assert!(!catalog.is_empty());

        for field in catalog.fields() {
            assert!(!field.patterns.is_empty(), "{} has no patterns", field.name());
            for pattern in &field.patterns {
                assert!(
                    pattern.regex.is_some(),
                    "{} pattern #{} does not compile: {}",
                    field.name(),
                    pattern.index,
                    pattern.source
                );
            }
        }
    }

    #[test]
    fn test_builtin_catalog_groups() {
        let catalog = PatternCatalog::builtin().unwrap();
        let group = |name: &str| catalog.field(name).and_then(|f| f.spec.group);

        assert_eq!(group("item_code"), Some(FieldGroup::Identifiers));
        assert_eq!(group("invoice_total"), Some(FieldGroup::Financial));
        assert_eq!(group("package_type"), Some(FieldGroup::Goods));
        assert_eq!(group("currency_rate"), Some(FieldGroup::Administrative));
        assert_eq!(group("insurance"), None);
    }
}
