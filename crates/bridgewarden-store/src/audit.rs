//! # Audit Logger
//!
//! Append-only JSON-lines stream of guard decisions. One object per
//! line, keys sorted, ASCII-safe encoding, and never any content: the
//! event carries hashes and decision metadata only, so the log can ship
//! to ordinary log infrastructure without re-leaking guarded text.

use crate::clock::{system_clock, Clock};
use crate::encode::to_ascii_json;
use crate::error::StoreError;
use bridgewarden_guard::{AuditSink, Decision, GuardResult, Redaction, ReasonCode, Source};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Structured audit record for a single guard decision.
///
/// Fields are declared alphabetically; the serialized event keeps its
/// keys sorted. `sanitized_text` and `original_text` are deliberately
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub approval_id: Option<String>,
    pub cache_hit: bool,
    pub content_hash: String,
    pub decision: Decision,
    pub policy_version: String,
    pub quarantine_id: Option<String>,
    pub reasons: Vec<ReasonCode>,
    pub redactions: Vec<Redaction>,
    pub risk_score: f64,
    pub source: Source,
    pub timestamp: String,
}

/// Build an audit event from a result and an explicit timestamp.
pub fn build_audit_event(result: &GuardResult, timestamp: &str) -> AuditEvent {
    AuditEvent {
        approval_id: result.approval_id.clone(),
        cache_hit: result.cache_hit,
        content_hash: result.content_hash.clone(),
        decision: result.decision,
        policy_version: result.policy_version.clone(),
        quarantine_id: result.quarantine_id.clone(),
        reasons: result.reasons.clone(),
        redactions: result.redactions.clone(),
        risk_score: result.risk_score,
        source: result.source.clone(),
        timestamp: timestamp.to_string(),
    }
}

/// Append-only JSONL audit log writer.
pub struct AuditLogger {
    path: PathBuf,
    clock: Clock,
}

impl AuditLogger {
    /// Create a logger appending to the given path. Parent directories
    /// are created eagerly so the first append cannot fail on a missing
    /// directory.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            clock: system_clock(),
        })
    }

    /// Replace the timestamp source (used by tests to pin timestamps).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event stamped with the logger's clock.
    pub fn log(&self, result: &GuardResult) -> Result<(), StoreError> {
        self.log_at(result, &(self.clock)())
    }

    /// Append one event with an explicit timestamp.
    pub fn log_at(&self, result: &GuardResult, timestamp: &str) -> Result<(), StoreError> {
        let event = build_audit_event(result, timestamp);
        let line = to_ascii_json(&event)?;
        let mut file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        // A single short write per line keeps appends atomic enough for
        // concurrent writers on POSIX filesystems.
        file.write_all(format!("{line}\n").as_bytes())?;
        Ok(())
    }
}

impl AuditSink for AuditLogger {
    fn log(&self, result: &GuardResult) -> std::io::Result<()> {
        AuditLogger::log(self, result).map_err(Into::into)
    }
}
