//! OCR output as consumed by the extractor.
//!
//! Recognition itself happens elsewhere; this is the document the OCR step
//! hands over for one page.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Recognized text of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    /// Full page text.
    pub text: String,

    /// Mean recognition confidence reported by the OCR engine (0-100).
    /// Informational only.
    #[serde(default)]
    pub confidence: f32,

    /// OCR processing time in seconds.
    #[serde(default)]
    pub processing_time: f64,

    /// Page number within the declaration, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

impl OcrPage {
    /// A page with text only.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_page_number(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    /// Parse an OCR page document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load an OCR page document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
