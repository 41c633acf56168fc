//! # The Guard Pipeline
//!
//! Composes the analysis stages into the canonical flow:
//!
//! ```text
//! raw text -> Normalize -> Sanitize -> Detect -> Redact -> Decide
//!                                                            |
//!                          +---------------------------------+
//!                          v
//!          BLOCK: empty sanitized_text, quarantine put
//!          ALLOW/WARN: redacted sanitized_text forwarded
//! ```
//!
//! The pipeline owns nothing persistent. Quarantine storage and audit
//! logging are reached through the [`QuarantineSink`] and [`AuditSink`]
//! seams so the pipeline is a pure input-to-output function given its
//! injected dependencies.

use crate::decision::{decide, get_profile, PolicyProfile};
use crate::detect::detect_reasons;
use crate::normalize::normalize_text;
use crate::redact::redact_secrets;
use crate::sanitize::sanitize_text;
use crate::types::{Decision, GuardResult, Redaction, ReasonCode, Source};
use crate::POLICY_VERSION;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors surfaced by the pipeline's injected stores.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The quarantine sink failed to persist a blocked record.
    #[error("quarantine store error: {0}")]
    Quarantine(#[source] std::io::Error),

    /// The audit sink failed to append the event.
    #[error("audit log error: {0}")]
    Audit(#[source] std::io::Error),
}

/// Decision metadata persisted next to quarantined content.
///
/// Must carry at least the decision, risk score, reasons, redactions,
/// source, and policy version so a quarantined record can be reviewed
/// without re-running the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantineMetadata {
    pub decision: Decision,
    pub risk_score: f64,
    pub reasons: Vec<ReasonCode>,
    pub redactions: Vec<Redaction>,
    pub source: Source,
    pub policy_version: String,
}

/// Storage seam for blocked content. Implementations must be
/// at-most-once per content hash: a second put for an existing record is
/// a no-op that preserves the original `created_at`.
pub trait QuarantineSink {
    /// Persist a quarantine record and return its id.
    fn put(
        &self,
        content_hash: &str,
        original_text: &str,
        sanitized_text: &str,
        metadata: &QuarantineMetadata,
    ) -> std::io::Result<String>;
}

/// Append-only audit seam. One event per guarded text, never containing
/// the content itself.
pub trait AuditSink {
    /// Append an audit event for this result.
    fn log(&self, result: &GuardResult) -> std::io::Result<()>;
}

/// Build the stable quarantine id for a content hash.
pub fn build_quarantine_id(content_hash: &str) -> String {
    format!("q_{content_hash}")
}

/// Hex SHA-256 of the raw input bytes.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// The guard pipeline with its injected dependencies.
///
/// # Example
///
/// ```rust
/// use bridgewarden_guard::{GuardPipeline, Source, Decision};
///
/// let pipeline = GuardPipeline::new("balanced");
/// let result = pipeline.guard("hello", Source::Local).unwrap();
/// assert_eq!(result.decision, Decision::Allow);
/// assert_eq!(result.sanitized_text, "hello");
/// ```
pub struct GuardPipeline<'a> {
    profile: &'static PolicyProfile,
    quarantine: Option<&'a dyn QuarantineSink>,
    audit: Option<&'a dyn AuditSink>,
}

impl<'a> GuardPipeline<'a> {
    /// Create a pipeline for the named profile (unknown names resolve to
    /// `strict`) with no stores wired.
    pub fn new(profile_name: &str) -> Self {
        Self {
            profile: get_profile(profile_name),
            quarantine: None,
            audit: None,
        }
    }

    /// Wire a quarantine sink for blocked content.
    pub fn with_quarantine(mut self, sink: &'a dyn QuarantineSink) -> Self {
        self.quarantine = Some(sink);
        self
    }

    /// Wire an audit sink receiving every result.
    pub fn with_audit(mut self, sink: &'a dyn AuditSink) -> Self {
        self.audit = Some(sink);
        self
    }

    /// The resolved policy profile.
    pub fn profile(&self) -> &'static PolicyProfile {
        self.profile
    }

    /// Run the full pipeline over one piece of text.
    ///
    /// On BLOCK the result carries an empty `sanitized_text` and the
    /// deterministic quarantine id; the pre-redaction original plus the
    /// redacted sanitized form are handed to the quarantine sink when one
    /// is wired. Store and audit failures propagate as [`GuardError`].
    pub fn guard(&self, text: &str, source: Source) -> Result<GuardResult, GuardError> {
        let normalized = normalize_text(text);
        let sanitized = sanitize_text(&normalized.text);
        let reasons = detect_reasons(&sanitized, normalized.unicode_suspicious, self.profile);
        let (redacted, redactions) = redact_secrets(&sanitized);
        let (decision, risk_score) = decide(&reasons, self.profile);
        let hash = content_hash(text);

        let (sanitized_text, quarantine_id) = if decision.is_block() {
            let quarantine_id = build_quarantine_id(&hash);
            if let Some(sink) = self.quarantine {
                let metadata = QuarantineMetadata {
                    decision,
                    risk_score,
                    reasons: reasons.clone(),
                    redactions: redactions.clone(),
                    source: source.clone(),
                    policy_version: POLICY_VERSION.to_string(),
                };
                sink.put(&hash, text, &redacted, &metadata)
                    .map_err(GuardError::Quarantine)?;
            }
            (String::new(), Some(quarantine_id))
        } else {
            (redacted, None)
        };

        let result = GuardResult {
            decision,
            risk_score,
            reasons,
            source,
            content_hash: hash,
            sanitized_text,
            quarantine_id,
            redactions,
            cache_hit: false,
            policy_version: POLICY_VERSION.to_string(),
            approval_id: None,
        };

        if let Some(sink) = self.audit {
            sink.log(&result).map_err(GuardError::Audit)?;
        }

        Ok(result)
    }
}
