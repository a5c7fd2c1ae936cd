//! Candidate collection: run every pattern of a field over the text.

use tracing::trace;

use crate::catalog::CompiledField;

/// A raw value found by one pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub raw_value: String,
    /// Index of the producing pattern in the field's pattern list.
    pub pattern_index: usize,
    /// Byte span of the value in the searched text.
    pub span: (usize, usize),
}

/// Collect every candidate value for `field` in `text`.
///
/// Patterns are applied in catalog order and each contributes all of its
/// non-overlapping matches. The value of a match is its first non-empty
/// capture group, or the whole match for patterns without groups.
pub fn collect(field: &CompiledField, text: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for pattern in &field.patterns {
        let Some(regex) = &pattern.regex else {
            continue;
        };

        let before = candidates.len();
        if regex.captures_len() > 1 {
            for caps in regex.captures_iter(text) {
                let value = caps
                    .iter()
                    .skip(1)
                    .flatten()
                    .find(|m| !m.as_str().is_empty());
                if let Some(m) = value {
                    candidates.push(Candidate {
                        raw_value: m.as_str().to_string(),
                        pattern_index: pattern.index,
                        span: (m.start(), m.end()),
                    });
                }
            }
        } else {
            for m in regex.find_iter(text).filter(|m| !m.as_str().is_empty()) {
                candidates.push(Candidate {
                    raw_value: m.as_str().to_string(),
                    pattern_index: pattern.index,
                    span: (m.start(), m.end()),
                });
            }
        }

        trace!(
            "{} pattern #{}: {} candidate(s)",
            field.name(),
            pattern.index,
            candidates.len() - before
        );
    }

    candidates
}
