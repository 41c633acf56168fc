//! Risk scoring and policy decisions.
//!
//! The decision engine maps a fired reason set and a policy profile to a
//! `(decision, risk_score)` pair. Weights, thresholds, and the hard block
//! list are part of the versioned policy: immutable data, initialized
//! once, never mutated at runtime.

use crate::types::{Decision, ReasonCode};

/// Detection tiers, ordered by how aggressively rules fire.
///
/// A rule tagged with a tier fires when the resolved profile's tier is at
/// least that value, so `Strict` enables the most rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Permissive = 1,
    Balanced = 2,
    Strict = 3,
}

/// Thresholds and overrides for risk decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyProfile {
    pub name: &'static str,
    pub tier: Tier,
    pub warn_threshold: f64,
    pub block_threshold: f64,
    pub block_reasons: &'static [ReasonCode],
}

/// Reasons that force a BLOCK regardless of the score thresholds.
pub const BLOCK_REASONS: &[ReasonCode] =
    &[ReasonCode::ProcessSabotage, ReasonCode::CodeTamperingCoercion];

static PERMISSIVE: PolicyProfile = PolicyProfile {
    name: "permissive",
    tier: Tier::Permissive,
    warn_threshold: 0.2,
    block_threshold: 0.95,
    block_reasons: BLOCK_REASONS,
};

static BALANCED: PolicyProfile = PolicyProfile {
    name: "balanced",
    tier: Tier::Balanced,
    warn_threshold: 0.2,
    block_threshold: 0.9,
    block_reasons: BLOCK_REASONS,
};

static STRICT: PolicyProfile = PolicyProfile {
    name: "strict",
    tier: Tier::Strict,
    warn_threshold: 0.2,
    block_threshold: 0.6,
    block_reasons: BLOCK_REASONS,
};

/// Resolve a policy profile by name. Unknown names resolve to `strict`,
/// the safe default.
pub fn get_profile(name: &str) -> &'static PolicyProfile {
    match name {
        "permissive" => &PERMISSIVE,
        "balanced" => &BALANCED,
        _ => &STRICT,
    }
}

/// Per-reason risk weight. Reasons absent from the table weigh 0.1.
fn weight(reason: ReasonCode) -> f64 {
    match reason {
        ReasonCode::RoleImpersonation => 0.4,
        ReasonCode::InstructionOverride => 0.5,
        ReasonCode::StealthInstruction => 0.3,
        ReasonCode::ProcessSabotage => 0.7,
        ReasonCode::CodeTamperingCoercion => 0.7,
        ReasonCode::DataExfiltration => 0.6,
        ReasonCode::PolicyBypass => 0.5,
        ReasonCode::DirectToolCall => 0.4,
        ReasonCode::SensitiveFileAccess => 0.6,
        ReasonCode::ShellExecution => 0.5,
        ReasonCode::PersonaHijack => 0.2,
        ReasonCode::UnicodeSuspicious => 0.2,
        _ => 0.1,
    }
}

/// Compute the deterministic risk score for a reason set: the capped sum
/// of per-reason weights, rounded to two decimals.
pub fn score_reasons(reasons: &[ReasonCode]) -> f64 {
    let total: f64 = reasons.iter().map(|r| weight(*r)).sum();
    (total.min(1.0) * 100.0).round() / 100.0
}

/// Return the decision and risk score for a set of reasons under a
/// profile. Hard block reasons override the thresholds; otherwise the
/// highest band whose threshold the score reaches wins.
pub fn decide(reasons: &[ReasonCode], profile: &PolicyProfile) -> (Decision, f64) {
    let risk_score = score_reasons(reasons);
    if reasons.iter().any(|r| profile.block_reasons.contains(r)) {
        return (Decision::Block, risk_score);
    }
    if risk_score >= profile.block_threshold {
        return (Decision::Block, risk_score);
    }
    if risk_score >= profile.warn_threshold {
        return (Decision::Warn, risk_score);
    }
    (Decision::Allow, risk_score)
}
