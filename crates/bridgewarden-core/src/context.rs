//! Context wiring: the on-disk data layout and the stores over it.
//!
//! ```text
//! <data_dir>/
//!   approvals/            one JSON file per approval
//!   quarantine/           one directory per blocked content hash
//!   logs/audit.jsonl      append-only audit stream
//!   repos/                extracted repository revisions
//! ```

use crate::config::BridgewardenConfig;
use crate::error::WardenError;
use crate::tools::ToolHandlers;
use bridgewarden_store::{ApprovalStore, AuditLogger, QuarantineStore};
use std::path::{Path, PathBuf};
use tracing::info;

/// Owns the data directory layout and the stores rooted in it.
pub struct WardenContext {
    pub config: BridgewardenConfig,
    data_dir: PathBuf,
    pub approvals: ApprovalStore,
    pub quarantine: QuarantineStore,
    pub audit: AuditLogger,
}

impl WardenContext {
    /// Create the directory layout under `data_dir` and open the stores.
    pub fn new(data_dir: impl Into<PathBuf>, config: BridgewardenConfig) -> Result<Self, WardenError> {
        let data_dir = data_dir.into();
        let approvals_dir = data_dir.join("approvals");
        let quarantine_dir = data_dir.join("quarantine");
        let logs_dir = data_dir.join("logs");
        let repos_dir = data_dir.join("repos");
        for dir in [&approvals_dir, &quarantine_dir, &logs_dir, &repos_dir] {
            std::fs::create_dir_all(dir)?;
        }

        let approvals = ApprovalStore::new(&approvals_dir)?;
        let quarantine = QuarantineStore::new(&quarantine_dir);
        let audit = AuditLogger::new(logs_dir.join("audit.jsonl"))?;

        info!(data_dir = %data_dir.display(), profile = %config.profile, "context initialized");
        Ok(Self {
            config,
            data_dir,
            approvals,
            quarantine,
            audit,
        })
    }

    /// The root data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Where extracted repository revisions are stored.
    pub fn repos_dir(&self) -> PathBuf {
        self.data_dir.join("repos")
    }

    /// Tool handlers wired to this context's stores, reading local files
    /// under `base_dir`.
    pub fn handlers(&self, base_dir: impl Into<PathBuf>) -> ToolHandlers<'_> {
        ToolHandlers::new(&self.config, base_dir)
            .with_quarantine(&self.quarantine)
            .with_approvals(&self.approvals)
            .with_audit(&self.audit)
    }
}
