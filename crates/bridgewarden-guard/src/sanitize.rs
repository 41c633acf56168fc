//! Coarse tag sanitization.
//!
//! Removes HTML-tag-like spans in a single pass to defang tag-framed
//! instructions before detection. The output is not HTML-safe; this is a
//! defanging step, not a renderer.

use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Strip tag-like spans (`<...>`) from the input.
pub fn sanitize_text(text: &str) -> String {
    TAG_RE.replace_all(text, "").into_owned()
}
