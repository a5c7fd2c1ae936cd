//! Text normalization for OCR output in Persian/Arabic script.
//!
//! OCR engines mix two digit scripts, two code points for several letters,
//! and leave invisible joiners and bidi marks in their output. Everything
//! downstream (the pattern catalog included) is written against the
//! canonical form produced here.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Words in Arabic script (joiners already stripped) and numbers.
    static ref TOKEN: Regex = Regex::new(
        r"[\p{Arabic}--\p{Nd}]+|\d+(?:[.,]\d+)*"
    ).unwrap();
}

/// Map a single character to its canonical form, or `None` if it is dropped.
fn canonical_char(c: char) -> Option<char> {
    match c {
        // Persian digits
        '\u{06F0}'..='\u{06F9}' => char::from_digit(c as u32 - 0x06F0, 10),
        // Arabic-Indic digits
        '\u{0660}'..='\u{0669}' => char::from_digit(c as u32 - 0x0660, 10),
        // Arabic kaf -> Persian keheh
        '\u{0643}' => Some('\u{06A9}'),
        // Arabic yeh, alef maksura -> Persian yeh
        '\u{064A}' | '\u{0649}' => Some('\u{06CC}'),
        // Teh marbuta -> heh
        '\u{0629}' => Some('\u{0647}'),
        // ZWNJ, ZWJ, LRM, RLM, BOM, Arabic letter mark
        '\u{200C}' | '\u{200D}' | '\u{200E}' | '\u{200F}' | '\u{FEFF}' | '\u{061C}' => None,
        // Bidi embeddings/overrides and isolates
        '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}' => None,
        _ => Some(c),
    }
}

/// Canonicalize digits, look-alike letters and invisible marks.
///
/// Whitespace is left untouched, which makes this safe to apply to regex
/// sources as well as to text.
pub fn canonicalize(text: &str) -> String {
    text.chars().filter_map(canonical_char).collect()
}

/// Convert Persian and Arabic-Indic digits to ASCII, leaving everything else.
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{06F0}'..='\u{06F9}' | '\u{0660}'..='\u{0669}' => {
                canonical_char(c).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}

/// Fully normalize OCR text.
///
/// Canonicalizes characters, collapses whitespace runs into a single space
/// and trims both ends. `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars().filter_map(canonical_char) {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }

    out
}

/// Project normalized text into the quoted token stream `"a", "b", ...`.
///
/// Structural catalog patterns such as `"(\d{8})"[^"]*"032"` were authored
/// against this view of the page: Arabic-script words and numbers only, each
/// wrapped in double quotes.
pub fn token_stream(text: &str) -> String {
    let normalized = normalize(text);
    let tokens: Vec<String> = TOKEN
        .find_iter(&normalized)
        .map(|m| format!("\"{}\"", m.as_str()))
        .collect();
    tokens.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_digits_both_scripts() {
        assert_eq!(normalize("۸۸۸۸۸۸۸۸"), "88888888");
        assert_eq!(normalize("٨٨٨٨٨٨٨٨"), "88888888");
        assert_eq!(normalize_digits("کد ۱۲۳ و ٤٥٦"), "کد 123 و 456");
    }

    #[test]
    fn test_normalize_letters() {
        assert_eq!(normalize("فاكتور"), "فاکتور");
        assert_eq!(normalize("يورو"), "یورو");
        assert_eq!(normalize("بىكيرى"), "بیکیری");
        assert_eq!(normalize("ة"), "ه");
    }

    #[test]
    fn test_normalize_strips_invisible_marks() {
        assert_eq!(normalize("\u{FEFF}می\u{200C}خواهم\u{200F}"), "میخواهم");
        assert_eq!(normalize("\u{202B}abc\u{202C}"), "abc");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize("  a \t\n b  \u{00A0} c "), "a b c");
        // Marks between spaces must not leave a double space behind
        assert_eq!(normalize("a \u{200C} b"), "a b");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \u{200C}\n "), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let samples = [
            "",
            "  نرخ ارز :  ۱۲۳۴۵۶٫۰  ",
            "كد كالا\u{200C}: ٨٤٧١٣٠٠٠\n\nوزن",
            "\u{FEFF}\u{200E} mixed EUR ۱۲,۵۰۰ \u{2067}x\u{2069}",
            "\"ک77\", \"12345678\"",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_canonicalize_keeps_whitespace() {
        assert_eq!(canonicalize("ك\\s*٧٧"), "ک\\s*77");
    }

    #[test]
    fn test_token_stream() {
        let stream = token_stream("كد كالا: ٨٤٧١٣٠٠٠ (EUR) 12,500");
        assert_eq!(stream, "\"کد\", \"کالا\", \"84713000\", \"12,500\"");
    }
}
