//! # Quarantine Store
//!
//! File-backed, at-most-once storage for blocked content. Each record
//! lives in its own directory keyed by the content hash:
//!
//! ```text
//! <root>/q_<hash>/
//!   original.txt    pre-redaction input, exactly as received
//!   sanitized.txt   redacted sanitized form, safe for review
//!   record.json     decision metadata (sorted keys, ASCII-safe)
//! ```
//!
//! `record.json` is the commit point: its presence makes a repeated put
//! for the same hash a no-op, which preserves the original `created_at`
//! and gives the store at-most-once semantics under concurrent writers.
//!
//! ## Security Notes
//!
//! - The original text is stored verbatim for review but never returned
//!   raw: [`QuarantineStore::get_view`] re-redacts and truncates it.
//! - The store never deletes; review tooling decides record lifecycle.

use crate::clock::{system_clock, Clock};
use crate::encode::to_ascii_json;
use crate::error::StoreError;
use bridgewarden_guard::{
    build_quarantine_id, redact_secrets, Decision, QuarantineMetadata, QuarantineSink, Redaction,
    ReasonCode, Source,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const RECORD_FILENAME: &str = "record.json";
const ORIGINAL_FILENAME: &str = "original.txt";
const SANITIZED_FILENAME: &str = "sanitized.txt";

/// The decision metadata persisted with quarantined content.
///
/// Fields are declared alphabetically; the serialized record keeps its
/// keys sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantineRecord {
    pub content_hash: String,
    pub created_at: String,
    pub decision: Decision,
    pub policy_version: String,
    pub reasons: Vec<ReasonCode>,
    pub redactions: Vec<Redaction>,
    pub risk_score: f64,
    pub source: Source,
}

/// Safe view of a quarantined record for review tooling.
///
/// `original_excerpt` is the stored original passed back through the
/// redactor and truncated; `sanitized_text` is returned verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarantineView {
    pub quarantine_id: String,
    pub original_excerpt: String,
    pub sanitized_text: String,
    pub metadata: QuarantineRecord,
}

/// File-backed store for quarantined content.
pub struct QuarantineStore {
    root: PathBuf,
    clock: Clock,
}

impl QuarantineStore {
    /// Create a store rooted at the given directory. The directory is
    /// created lazily on first put.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            clock: system_clock(),
        }
    }

    /// Replace the timestamp source (used by tests to pin `created_at`).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist a quarantine record and return its id.
    ///
    /// At-most-once per content hash: when `record.json` already exists
    /// the call returns the existing id without touching any file.
    pub fn put(
        &self,
        content_hash: &str,
        original_text: &str,
        sanitized_text: &str,
        metadata: &QuarantineMetadata,
    ) -> Result<String, StoreError> {
        let quarantine_id = build_quarantine_id(content_hash);
        let record_dir = self.root.join(&quarantine_id);
        let record_path = record_dir.join(RECORD_FILENAME);
        if record_path.exists() {
            return Ok(quarantine_id);
        }

        fs::create_dir_all(&record_dir)?;
        fs::write(record_dir.join(ORIGINAL_FILENAME), original_text)?;
        fs::write(record_dir.join(SANITIZED_FILENAME), sanitized_text)?;

        // record.json is written last: it is the commit point.
        let record = QuarantineRecord {
            content_hash: content_hash.to_string(),
            created_at: (self.clock)(),
            decision: metadata.decision,
            policy_version: metadata.policy_version.clone(),
            reasons: metadata.reasons.clone(),
            redactions: metadata.redactions.clone(),
            risk_score: metadata.risk_score,
            source: metadata.source.clone(),
        };
        fs::write(&record_path, to_ascii_json(&record)?)?;

        info!(quarantine_id = %quarantine_id, "quarantined blocked content");
        Ok(quarantine_id)
    }

    /// Load a stored quarantine record.
    pub fn get_record(&self, quarantine_id: &str) -> Result<QuarantineRecord, StoreError> {
        let path = self.root.join(quarantine_id).join(RECORD_FILENAME);
        if !path.exists() {
            return Err(StoreError::NotFound(quarantine_id.to_string()));
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Return a safe view of a quarantined record: the original is
    /// re-redacted and truncated to `excerpt_limit` bytes (flooring to a
    /// character boundary) with a trailing `"..."`.
    pub fn get_view(
        &self,
        quarantine_id: &str,
        excerpt_limit: usize,
    ) -> Result<QuarantineView, StoreError> {
        let record = self.get_record(quarantine_id)?;
        let record_dir = self.root.join(quarantine_id);
        let sanitized_text = fs::read_to_string(record_dir.join(SANITIZED_FILENAME))?;
        let original_text = fs::read_to_string(record_dir.join(ORIGINAL_FILENAME))?;
        let (redacted_original, _) = redact_secrets(&original_text);
        Ok(QuarantineView {
            quarantine_id: quarantine_id.to_string(),
            original_excerpt: excerpt(&redacted_original, excerpt_limit),
            sanitized_text,
            metadata: record,
        })
    }
}

impl QuarantineSink for QuarantineStore {
    fn put(
        &self,
        content_hash: &str,
        original_text: &str,
        sanitized_text: &str,
        metadata: &QuarantineMetadata,
    ) -> std::io::Result<String> {
        QuarantineStore::put(self, content_hash, original_text, sanitized_text, metadata)
            .map_err(Into::into)
    }
}

/// Truncate to at most `limit` bytes on a char boundary, appending an
/// ellipsis when anything was cut.
fn excerpt(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
