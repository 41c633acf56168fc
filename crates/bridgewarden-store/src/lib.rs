//! # BridgeWarden Store
//!
//! File-backed persistence for the guarding pipeline: quarantine records
//! for blocked content, the source approval state machine, and the
//! append-only audit log.
//!
//! ## Storage Structure
//!
//! All three stores live under the process data directory:
//!
//! | Store | Layout | Semantics |
//! |-------|--------|-----------|
//! | Quarantine | `quarantine/q_<hash>/{record.json, original.txt, sanitized.txt}` | at-most-once per content hash |
//! | Approvals | `approvals/a_<uuid>.json` | PENDING -> APPROVED \| DENIED, terminal |
//! | Audit | `logs/audit.jsonl` | append-only, one event per line |
//!
//! ## Security Notes
//!
//! - Records are plain JSON with sorted keys and ASCII-safe encoding so
//!   they diff and ship cleanly.
//! - The audit log never contains guarded content, only hashes and
//!   decision metadata.
//! - Clocks and id factories are injected; tests pin both.

mod approvals;
mod audit;
mod clock;
mod encode;
mod error;
mod quarantine;

pub use approvals::{
    ApprovalKind, ApprovalOutcome, ApprovalRecord, ApprovalRequest, ApprovalStatus, ApprovalStore,
    IdFactory,
};
pub use audit::{build_audit_event, AuditEvent, AuditLogger};
pub use clock::Clock;
pub use error::StoreError;
pub use quarantine::{QuarantineRecord, QuarantineStore, QuarantineView};
