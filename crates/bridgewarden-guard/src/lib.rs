//! # BridgeWarden Guard
//!
//! Content-guarding pipeline for text arriving from untrusted sources.
//! Normalizes, sanitizes, detects instruction-coercion patterns, redacts
//! secrets, and maps the findings to an ALLOW / WARN / BLOCK decision.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       GuardPipeline                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  raw text ──▶ Normalizer ──▶ Sanitizer ──▶ Detector         │
//! │                (NFKC, bidi)   (tag strip)   (A/B/C rules)   │
//! │                                                  │          │
//! │                    Redactor ◀────────────────────┘          │
//! │                       │                                     │
//! │                       ▼                                     │
//! │                Decision engine ──▶ GuardResult              │
//! │               (weights, profiles)      │                    │
//! │                                        ▼                    │
//! │                        QuarantineSink / AuditSink           │
//! │                            (injected seams)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Notes
//!
//! - Every rule table, weight, and threshold is immutable data compiled
//!   once at startup; [`POLICY_VERSION`] stamps each result so consumers
//!   can detect behavior changes.
//! - The detector is deterministic: identical input and profile always
//!   produce the same sorted reason set.
//! - Blocked content never leaves the pipeline; only the quarantine sink
//!   sees the original text.

mod decision;
mod detect;
mod normalize;
mod pipeline;
mod redact;
mod sanitize;
mod types;

pub use decision::{decide, get_profile, score_reasons, PolicyProfile, Tier, BLOCK_REASONS};
pub use detect::detect_reasons;
pub use normalize::{normalize_text, NormalizedText};
pub use pipeline::{
    build_quarantine_id, content_hash, AuditSink, GuardError, GuardPipeline, QuarantineMetadata,
    QuarantineSink,
};
pub use redact::{redact_secrets, REDACTED_MARKER};
pub use sanitize::sanitize_text;
pub use types::{Decision, GuardResult, Redaction, RedactionKind, ReasonCode, Source};

/// Stable policy version stamped on every result and audit event.
pub const POLICY_VERSION: &str = "0.1.0-dev";

/// Profile used when the caller does not specify one.
pub const DEFAULT_PROFILE: &str = "balanced";
