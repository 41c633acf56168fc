//! # Source Approval Store
//!
//! File-backed request/decide/list state machine for admitting new
//! content sources. One JSON file per approval under the root:
//!
//! ```text
//! <root>/a_<uuid>.json
//! ```
//!
//! State machine: `PENDING -> APPROVED | DENIED`, terminal. Deciding an
//! already-decided request is a no-op that returns the current record.
//!
//! The id factory and the clock are injected so tests mint stable ids
//! and timestamps; production uses UUID v4 and RFC 3339 UTC now.

use crate::clock::{system_clock, Clock};
use crate::encode::to_ascii_json;
use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Approval id source, injectable for deterministic tests.
pub type IdFactory = Box<dyn Fn() -> String + Send + Sync>;

/// What kind of source an approval admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    WebDomain,
    RepoUrl,
}

impl ApprovalKind {
    /// The wire token for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebDomain => "web_domain",
            Self::RepoUrl => "repo_url",
        }
    }
}

/// Lifecycle state of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Denied,
}

/// A human decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Approved,
    Denied,
}

impl From<ApprovalOutcome> for ApprovalStatus {
    fn from(outcome: ApprovalOutcome) -> Self {
        match outcome {
            ApprovalOutcome::Approved => ApprovalStatus::Approved,
            ApprovalOutcome::Denied => ApprovalStatus::Denied,
        }
    }
}

/// Payload for a new approval request.
///
/// `rationale` and `requested_by` travel on the wire for reviewers but
/// are not persisted in the status record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub kind: ApprovalKind,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
}

/// A stored approval record. Fields are declared alphabetically; the
/// serialized record keeps its keys sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub approval_id: String,
    pub created_at: String,
    pub decided_at: Option<String>,
    pub decided_by: Option<String>,
    pub kind: ApprovalKind,
    pub notes: Option<String>,
    pub status: ApprovalStatus,
    pub target: String,
}

/// File-backed store for approval requests and decisions.
pub struct ApprovalStore {
    root: PathBuf,
    id_factory: IdFactory,
    clock: Clock,
}

impl ApprovalStore {
    /// Open a store rooted at the given directory, creating it if
    /// needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            id_factory: Box::new(|| format!("a_{}", Uuid::new_v4().simple())),
            clock: system_clock(),
        })
    }

    /// Replace the id source (used by tests to mint stable ids).
    pub fn with_id_factory(mut self, id_factory: IdFactory) -> Self {
        self.id_factory = id_factory;
        self
    }

    /// Replace the timestamp source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a new PENDING approval request.
    pub fn request(&self, request: &ApprovalRequest) -> Result<ApprovalRecord, StoreError> {
        let record = ApprovalRecord {
            approval_id: (self.id_factory)(),
            created_at: (self.clock)(),
            decided_at: None,
            decided_by: None,
            kind: request.kind,
            notes: None,
            status: ApprovalStatus::Pending,
            target: request.target.clone(),
        };
        self.write(&record)?;
        info!(
            approval_id = %record.approval_id,
            kind = record.kind.as_str(),
            target = %record.target,
            "approval requested"
        );
        Ok(record)
    }

    /// Fetch a single approval record by id.
    pub fn get(&self, approval_id: &str) -> Result<ApprovalRecord, StoreError> {
        let path = self.record_path(approval_id);
        if !path.exists() {
            return Err(StoreError::NotFound(approval_id.to_string()));
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// List approvals with optional status/kind filters, ordered by file
    /// name ascending, capped at `limit`.
    pub fn list(
        &self,
        status: Option<ApprovalStatus>,
        kind: Option<ApprovalKind>,
        limit: usize,
    ) -> Result<Vec<ApprovalRecord>, StoreError> {
        let mut names: Vec<String> = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort();

        let mut approvals = Vec::new();
        for name in names {
            let raw = fs::read_to_string(self.root.join(&name))?;
            let record: ApprovalRecord = serde_json::from_str(&raw)?;
            if let Some(wanted) = status {
                if record.status != wanted {
                    continue;
                }
            }
            if let Some(wanted) = kind {
                if record.kind != wanted {
                    continue;
                }
            }
            approvals.push(record);
            if approvals.len() >= limit {
                break;
            }
        }
        Ok(approvals)
    }

    /// Approve or deny a pending request. Deciding a record that is no
    /// longer PENDING returns it unchanged.
    pub fn decide(
        &self,
        approval_id: &str,
        outcome: ApprovalOutcome,
        notes: Option<&str>,
        decided_by: Option<&str>,
    ) -> Result<ApprovalRecord, StoreError> {
        let current = self.get(approval_id)?;
        if current.status != ApprovalStatus::Pending {
            return Ok(current);
        }

        let updated = ApprovalRecord {
            decided_at: Some((self.clock)()),
            decided_by: decided_by.map(str::to_string),
            notes: notes.map(str::to_string),
            status: outcome.into(),
            ..current
        };
        self.write(&updated)?;
        info!(
            approval_id = %updated.approval_id,
            status = ?updated.status,
            "approval decided"
        );
        Ok(updated)
    }

    /// Check whether an APPROVED record exists for this exact target.
    pub fn is_approved(&self, kind: ApprovalKind, target: &str) -> Result<bool, StoreError> {
        let approved = self.list(Some(ApprovalStatus::Approved), Some(kind), 1000)?;
        Ok(approved.iter().any(|record| record.target == target))
    }

    fn record_path(&self, approval_id: &str) -> PathBuf {
        self.root.join(format!("{approval_id}.json"))
    }

    fn write(&self, record: &ApprovalRecord) -> Result<(), StoreError> {
        let path = self.record_path(&record.approval_id);
        fs::write(path, to_ascii_json(record)?)?;
        Ok(())
    }
}
