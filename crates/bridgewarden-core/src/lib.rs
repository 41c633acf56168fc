//! # BridgeWarden Core
//!
//! Policy gates and the tool surface for the BridgeWarden guarding
//! intermediary. Sits between an LLM-driven agent and untrusted content
//! sources, composing the component crates behind a small set of
//! guarded endpoints.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      BRIDGEWARDEN CORE                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │                    ┌─────────────────┐                          │
//! │                    │  ToolHandlers   │  ← policy gates          │
//! │                    └────────┬────────┘                          │
//! │                             │                                   │
//! │         ┌───────────────────┼───────────────────┐               │
//! │         ▼                   ▼                   ▼               │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐          │
//! │  │    Guard    │    │   Stores    │    │    Fetch    │          │
//! │  │  pipeline   │    │ (q/a/audit) │    │ (web/repo)  │          │
//! │  └─────────────┘    └─────────────┘    └─────────────┘          │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Notes
//!
//! - Gates run in a fixed order; the first failing gate wins and is
//!   encoded as a BLOCK result, never an exception.
//! - Network and DNS are reached only through injected seams, so every
//!   policy path is testable without touching the network.
//! - The SSRF gate fails closed: unresolvable names are rejected.

mod config;
mod context;
mod error;
mod ssrf;
mod tools;
mod urlnorm;

pub use config::{
    config_from_value, load_config, ApprovalPolicy, BridgewardenConfig, ConfigError, NetworkPolicy,
    DEFAULT_PROFILE, POLICY_VERSION,
};
pub use context::WardenContext;
pub use error::WardenError;
pub use ssrf::{is_private_ip, is_ssrf_risk, normalize_host, DnsResolve, SystemResolver};
pub use tools::{RepoFetch, RepoFetchResponse, ToolHandlers, WebFetch};
pub use urlnorm::normalize_raw_file_url;

// Re-export component types for convenience
pub use bridgewarden_fetch::{
    HttpClient, HttpGet, NetworkError, RepoError, RepoFetcher, RepoLimits, RepoRequest, RepoScan,
};
pub use bridgewarden_guard::{
    Decision, GuardPipeline, GuardResult, ReasonCode, Redaction, RedactionKind, Source,
};
pub use bridgewarden_store::{
    ApprovalKind, ApprovalOutcome, ApprovalRecord, ApprovalRequest, ApprovalStatus, ApprovalStore,
    AuditLogger, QuarantineStore, QuarantineView, StoreError,
};

/// Core result type for tool-surface operations.
pub type Result<T> = std::result::Result<T, WardenError>;
