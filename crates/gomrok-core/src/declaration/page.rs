//! Page-type classification of multi-page declarations.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GomrokError, Result};
use crate::models::config::PageConfig;

lazy_static! {
    static ref DEFAULT_MARKER: Regex = Regex::new(r"\b31\s+").unwrap();
}

/// Position of a page within a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    SingleItem,
    FirstPage,
    MiddlePage,
    LastPage,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::SingleItem => "single_item",
            PageType::FirstPage => "first_page",
            PageType::MiddlePage => "middle_page",
            PageType::LastPage => "last_page",
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a page by counting a structural marker.
///
/// Item rows on continuation pages carry the box number `31`. No marker means
/// a one-item declaration, a single one closes the declaration, and a dense
/// cluster opens it.
#[derive(Debug, Clone)]
pub struct PageClassifier {
    marker: Regex,
    first_page_min_markers: usize,
}

impl PageClassifier {
    pub fn new(config: &PageConfig) -> Result<Self> {
        let marker = Regex::new(&config.marker_pattern).map_err(|e| {
            GomrokError::Config(format!(
                "invalid page marker pattern {:?}: {}",
                config.marker_pattern, e
            ))
        })?;
        Ok(Self {
            marker,
            first_page_min_markers: config.first_page_min_markers,
        })
    }

    pub fn with_first_page_min_markers(mut self, markers: usize) -> Self {
        self.first_page_min_markers = markers;
        self
    }

    /// Number of markers on the page.
    pub fn count_markers(&self, text: &str) -> usize {
        self.marker.find_iter(text).count()
    }

    pub fn classify(&self, text: &str) -> PageType {
        let markers = self.count_markers(text);
        let page_type = match markers {
            0 => PageType::SingleItem,
            1 => PageType::LastPage,
            n if n >= self.first_page_min_markers => PageType::FirstPage,
            _ => PageType::MiddlePage,
        };
        debug!("Page has {} marker(s): {}", markers, page_type);
        page_type
    }
}

impl Default for PageClassifier {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.clone(),
            first_page_min_markers: PageConfig::default().first_page_min_markers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classifier() -> PageClassifier {
        PageClassifier::new(&PageConfig::default()).unwrap()
    }

    #[test]
    fn test_classify_by_marker_count() {
        let c = classifier();
        assert_eq!(c.classify("no markers here"), PageType::SingleItem);
        assert_eq!(c.classify("31 قلم"), PageType::LastPage);
        assert_eq!(c.classify("31 a 31 b"), PageType::MiddlePage);
        assert_eq!(c.classify("31 a 31 b 31 c"), PageType::MiddlePage);
        assert_eq!(c.classify("31 a 31 b 31 c 31 d"), PageType::FirstPage);
    }

    #[test]
    fn test_marker_needs_word_boundary_and_space() {
        let c = classifier();
        assert_eq!(c.count_markers("131 x"), 0);
        assert_eq!(c.count_markers("31x"), 0);
        assert_eq!(c.count_markers("(31 x"), 1);
    }

    #[test]
    fn test_default_matches_default_config() {
        let c = PageClassifier::default();
        assert_eq!(c.classify("31 a 31 b 31 c 31 d"), PageType::FirstPage);
        let c = c.with_first_page_min_markers(5);
        assert_eq!(c.classify("31 a 31 b 31 c 31 d"), PageType::MiddlePage);
    }

    #[test]
    fn test_empty_page() {
        assert_eq!(classifier().classify(""), PageType::SingleItem);
    }

    #[test]
    fn test_invalid_marker_pattern() {
        let config = PageConfig {
            marker_pattern: "(".to_string(),
            ..PageConfig::default()
        };
        assert!(matches!(
            PageClassifier::new(&config),
            Err(GomrokError::Config(_))
        ));
    }

    #[test]
    fn test_serialize() {
        assert_eq!(
            serde_json::to_string(&PageType::MiddlePage).unwrap(),
            "\"middle_page\""
        );
    }
}
