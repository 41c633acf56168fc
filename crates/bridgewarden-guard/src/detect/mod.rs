//! # Heuristic Injection Detector
//!
//! Produces the sorted, deduplicated set of reason codes for a piece of
//! sanitized text under a policy profile. Three rule classes contribute:
//!
//! | Class | Table | Gate |
//! |-------|-------|------|
//! | A | English regex rules | code's minimum tier |
//! | B | Core multilingual phrases | code's minimum tier; match records a language hint |
//! | C | Extended per-language phrases | code's minimum tier AND a Class-B hint for that language |
//!
//! An obfuscation sweep runs alongside: the input is collapsed to
//! lowercase alphanumerics and tested against a fingerprint table plus
//! the collapsed forms of Class-B/C phrases, so spacing and punctuation
//! tricks do not evade the phrase rules.
//!
//! The output is deterministic and stable across runs for identical
//! input and profile; the rule tables are versioned policy data.

mod lexicon;
mod rules;

use crate::decision::PolicyProfile;
use crate::types::ReasonCode;
use lexicon::{collapse, Lang, CORE_MATCHERS, EXTENDED_MATCHERS};
use rules::{min_tier, ENGLISH_RULES, OBFUSCATION_FINGERPRINTS};
use std::collections::{BTreeSet, HashSet};

/// Minimum collapsed length for a phrase to join the obfuscation sweep;
/// shorter phrases collide with ordinary text too easily.
const COLLAPSE_MIN_CHARS: usize = 6;

/// Detect instruction-coercion patterns in sanitized text.
///
/// Returns the sorted, deduplicated reason codes fired under the given
/// profile. `unicode_suspicious` (from the normalizer) contributes
/// `UNICODE_SUSPICIOUS` unconditionally.
pub fn detect_reasons(
    text: &str,
    unicode_suspicious: bool,
    profile: &PolicyProfile,
) -> Vec<ReasonCode> {
    let tier = profile.tier;
    let mut reasons: BTreeSet<ReasonCode> = BTreeSet::new();

    // Class A: English regex rules.
    for rule in ENGLISH_RULES.iter() {
        if tier >= rule.tier && rule.pattern.is_match(text) {
            reasons.insert(rule.code);
        }
    }

    let collapsed = collapse(text);

    // Class B: core multilingual phrases. A firing phrase both emits its
    // code and hints its language for the Class-C pass.
    let mut hinted: HashSet<Lang> = HashSet::new();
    for matcher in CORE_MATCHERS.iter() {
        if tier < min_tier(matcher.code) {
            continue;
        }
        let hit = matcher.pattern.is_match(text)
            || (matcher.collapsed.chars().count() >= COLLAPSE_MIN_CHARS
                && collapsed.contains(&matcher.collapsed));
        if hit {
            reasons.insert(matcher.code);
            hinted.insert(matcher.lang);
        }
    }

    // Class C: extended phrases, only for hinted languages.
    for matcher in EXTENDED_MATCHERS.iter() {
        if !hinted.contains(&matcher.lang) || tier < min_tier(matcher.code) {
            continue;
        }
        let hit = matcher.pattern.is_match(text)
            || (matcher.collapsed.chars().count() >= COLLAPSE_MIN_CHARS
                && collapsed.contains(&matcher.collapsed));
        if hit {
            reasons.insert(matcher.code);
        }
    }

    // Obfuscation sweep over the fixed fingerprint table.
    for fingerprint in OBFUSCATION_FINGERPRINTS {
        if tier >= min_tier(fingerprint.code) && collapsed.contains(fingerprint.collapsed) {
            reasons.insert(fingerprint.code);
        }
    }

    if unicode_suspicious {
        reasons.insert(ReasonCode::UnicodeSuspicious);
    }

    reasons.into_iter().collect()
}
