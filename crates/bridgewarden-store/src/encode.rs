//! ASCII-safe JSON encoding for on-disk records.
//!
//! Every persisted record and audit line is encoded with non-ASCII
//! characters escaped as `\uXXXX`, so log shippers and line-oriented
//! tooling never see raw multibyte sequences. Key order is fixed by the
//! record structs, which declare their fields alphabetically.

use serde::Serialize;

/// Serialize a value to JSON with all non-ASCII characters escaped.
pub(crate) fn to_ascii_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let raw = serde_json::to_string(value)?;
    // Non-ASCII bytes can only occur inside string literals here, so a
    // whole-document escape is safe.
    let mut out = String::with_capacity(raw.len());
    let mut units = [0u16; 2];
    for ch in raw.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ascii_passthrough() {
        let value = json!({"a": 1, "b": "plain"});
        assert_eq!(to_ascii_json(&value).unwrap(), r#"{"a":1,"b":"plain"}"#);
    }

    #[test]
    fn test_escapes_non_ascii() {
        let value = json!({"text": "héllo"});
        let encoded = to_ascii_json(&value).unwrap();
        assert!(encoded.is_ascii());
        assert_eq!(encoded, "{\"text\":\"h\\u00e9llo\"}");
        let back: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(back["text"], "héllo");
    }

    #[test]
    fn test_escapes_astral_plane_as_surrogates() {
        let value = json!({"emoji": "🙂"});
        let encoded = to_ascii_json(&value).unwrap();
        assert!(encoded.contains(r"\ud83d"));
        let back: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(back["emoji"], "🙂");
    }
}
