//! Unicode normalization and suspicious character stripping.
//!
//! NFKC folding collapses visually-confusable compatibility forms before
//! detection runs; bidi overrides and zero-width characters are removed
//! outright and their presence raises the `unicode_suspicious` flag.

use unicode_normalization::UnicodeNormalization;

/// Bidirectional override and isolate controls (U+202A..U+202E,
/// U+2066..U+2069).
const BIDI_CHARS: [char; 9] = [
    '\u{202A}', '\u{202B}', '\u{202C}', '\u{202D}', '\u{202E}',
    '\u{2066}', '\u{2067}', '\u{2068}', '\u{2069}',
];

/// Zero-width characters used to split keywords invisibly.
const ZERO_WIDTH_CHARS: [char; 5] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// Normalized text plus the unicode risk flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub unicode_suspicious: bool,
}

/// Normalize text to NFKC, unify newlines to `\n`, and strip bidi and
/// zero-width characters.
///
/// Idempotent: normalizing the output again yields the same text with
/// `unicode_suspicious == false`.
pub fn normalize_text(text: &str) -> NormalizedText {
    let folded: String = text.nfkc().collect();
    let folded = folded.replace("\r\n", "\n").replace('\r', "\n");

    let mut cleaned = String::with_capacity(folded.len());
    let mut suspicious = false;
    for ch in folded.chars() {
        if BIDI_CHARS.contains(&ch) || ZERO_WIDTH_CHARS.contains(&ch) {
            suspicious = true;
            continue;
        }
        cleaned.push(ch);
    }

    NormalizedText {
        text: cleaned,
        unicode_suspicious: suspicious,
    }
}
