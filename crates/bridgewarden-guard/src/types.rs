//! # Core Types for the Guard Pipeline
//!
//! This module defines the closed vocabularies and result envelope used
//! throughout BridgeWarden: reason codes, decisions, redaction metadata,
//! content sources, and the canonical [`GuardResult`].
//!
//! ## Design Principles
//!
//! 1. **Closed vocabularies** - Every string that crosses the wire
//!    (`decision`, reason codes, redaction kinds, `source.kind`) is a Rust
//!    enum; JSON strings map to variants at the boundary.
//! 2. **Stable ordering** - Reason sets are always serialized as sorted,
//!    deduplicated sequences. [`ReasonCode`]'s ordering delegates to its
//!    wire string so "sorted" has exactly one meaning.
//! 3. **Serializable** - All types derive Serde traits for tool responses
//!    and audit trails.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Reason codes emitted by the detector and the policy gates.
///
/// The vocabulary is closed: detection rules, policy-outcome blocks, and
/// the repo fetcher's synthetic findings all draw from this enum. The wire
/// form is the SCREAMING_SNAKE_CASE token (e.g. `ROLE_IMPERSONATION`).
///
/// | Group | Examples |
/// |-------|----------|
/// | Detection | `INSTRUCTION_OVERRIDE`, `PROCESS_SABOTAGE`, `SHELL_EXECUTION` |
/// | Policy gate | `PATH_TRAVERSAL`, `SSRF_BLOCKED`, `NETWORK_DISABLED` |
/// | Synthetic | `FILE_TOO_LARGE`, `UNICODE_SUSPICIOUS` |
///
/// `PERSONA_HIJACK` stays in the vocabulary (and in the weight table) for
/// compatibility with recorded policy versions even though no current rule
/// emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    // Detection: fired by the heuristic detector.
    CodeTamperingCoercion,
    CommandCoercion,
    DataExfiltration,
    DirectToolCall,
    InstructionHeader,
    InstructionOverride,
    MultiStepInstruction,
    ObfuscationMarker,
    PersonaHijack,
    PersonaShift,
    PolicyBypass,
    ProcessSabotage,
    PromptBoundary,
    ResponseConstraint,
    RoleHeader,
    RoleImpersonation,
    SensitiveFileAccess,
    ShellExecution,
    StealthInstruction,
    ToolCallSerialized,
    UnicodeSuspicious,

    // Policy outcomes: single-reason blocks produced by the tool surface.
    FileNotFound,
    InvalidMaxBytes,
    InvalidMode,
    NetworkDisabled,
    NetworkError,
    NetworkHostBlocked,
    NewSourceRequiresApproval,
    PathTraversal,
    RawModeNotAllowed,
    RepoFetchFailed,
    RepoIdUnsupported,
    SsrfBlocked,
    UnsupportedUrlScheme,

    // Synthetic: emitted by the repo fetcher without running the pipeline.
    FileTooLarge,
}

impl ReasonCode {
    /// The wire token for this reason code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CodeTamperingCoercion => "CODE_TAMPERING_COERCION",
            Self::CommandCoercion => "COMMAND_COERCION",
            Self::DataExfiltration => "DATA_EXFILTRATION",
            Self::DirectToolCall => "DIRECT_TOOL_CALL",
            Self::InstructionHeader => "INSTRUCTION_HEADER",
            Self::InstructionOverride => "INSTRUCTION_OVERRIDE",
            Self::MultiStepInstruction => "MULTI_STEP_INSTRUCTION",
            Self::ObfuscationMarker => "OBFUSCATION_MARKER",
            Self::PersonaHijack => "PERSONA_HIJACK",
            Self::PersonaShift => "PERSONA_SHIFT",
            Self::PolicyBypass => "POLICY_BYPASS",
            Self::ProcessSabotage => "PROCESS_SABOTAGE",
            Self::PromptBoundary => "PROMPT_BOUNDARY",
            Self::ResponseConstraint => "RESPONSE_CONSTRAINT",
            Self::RoleHeader => "ROLE_HEADER",
            Self::RoleImpersonation => "ROLE_IMPERSONATION",
            Self::SensitiveFileAccess => "SENSITIVE_FILE_ACCESS",
            Self::ShellExecution => "SHELL_EXECUTION",
            Self::StealthInstruction => "STEALTH_INSTRUCTION",
            Self::ToolCallSerialized => "TOOL_CALL_SERIALIZED",
            Self::UnicodeSuspicious => "UNICODE_SUSPICIOUS",
            Self::FileNotFound => "FILE_NOT_FOUND",
            Self::InvalidMaxBytes => "INVALID_MAX_BYTES",
            Self::InvalidMode => "INVALID_MODE",
            Self::NetworkDisabled => "NETWORK_DISABLED",
            Self::NetworkError => "NETWORK_ERROR",
            Self::NetworkHostBlocked => "NETWORK_HOST_BLOCKED",
            Self::NewSourceRequiresApproval => "NEW_SOURCE_REQUIRES_APPROVAL",
            Self::PathTraversal => "PATH_TRAVERSAL",
            Self::RawModeNotAllowed => "RAW_MODE_NOT_ALLOWED",
            Self::RepoFetchFailed => "REPO_FETCH_FAILED",
            Self::RepoIdUnsupported => "REPO_ID_UNSUPPORTED",
            Self::SsrfBlocked => "SSRF_BLOCKED",
            Self::UnsupportedUrlScheme => "UNSUPPORTED_URL_SCHEME",
            Self::FileTooLarge => "FILE_TOO_LARGE",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Reason sets are serialized sorted; ordering must follow the wire token,
// not the declaration order of the variants.
impl Ord for ReasonCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for ReasonCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The three-way outcome of a guard decision.
///
/// - `Allow`: content is forwarded sanitized
/// - `Warn`: content is forwarded sanitized, flagged for the caller
/// - `Block`: content is withheld and quarantined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Allow,
    Warn,
    Block,
}

impl Decision {
    /// The wire token for this decision.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Warn => "WARN",
            Self::Block => "BLOCK",
        }
    }

    /// Returns true if this decision withholds the content.
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of secrets the redactor masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedactionKind {
    ApiKey,
    AwsAccessKey,
    PrivateKey,
}

/// One redaction rule's outcome: the kind of secret and how many matches
/// were masked. A redaction list is ordered by the detection rule order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redaction {
    pub kind: RedactionKind,
    pub count: u64,
}

/// Where a piece of guarded content came from.
///
/// Serialized as a tagged object: `{"kind": "file", "path": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    /// Content handed to the pipeline directly.
    Local,
    /// A file resolved under the configured base directory.
    File { path: String },
    /// A web page fetched over HTTP(S).
    Web {
        url: String,
        domain: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resolved_url: Option<String>,
    },
    /// A repository archive, or a single file inside one.
    Repo {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        repo_id: Option<String>,
    },
}

/// The canonical output envelope of the guard pipeline.
///
/// Invariants:
///
/// - `decision == Block` iff `sanitized_text` is empty
/// - `reasons` is sorted and deduplicated
/// - `risk_score` is in `[0.0, 1.0]`, rounded to two decimals
/// - `content_hash` is the hex SHA-256 of the raw input, or empty for
///   policy blocks that never hashed any content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardResult {
    pub decision: Decision,
    pub risk_score: f64,
    pub reasons: Vec<ReasonCode>,
    pub source: Source,
    pub content_hash: String,
    pub sanitized_text: String,
    pub quarantine_id: Option<String>,
    pub redactions: Vec<Redaction>,
    pub cache_hit: bool,
    pub policy_version: String,
    pub approval_id: Option<String>,
}

impl GuardResult {
    /// Build a policy-outcome BLOCK: a single reason, maximum risk, no
    /// content hash (nothing was read), empty sanitized text.
    pub fn policy_block(reason: ReasonCode, source: Source) -> Self {
        Self {
            decision: Decision::Block,
            risk_score: 1.0,
            reasons: vec![reason],
            source,
            content_hash: String::new(),
            sanitized_text: String::new(),
            quarantine_id: None,
            redactions: Vec::new(),
            cache_hit: false,
            policy_version: crate::POLICY_VERSION.to_string(),
            approval_id: None,
        }
    }

    /// Same as [`GuardResult::policy_block`] with a pending approval id
    /// surfaced to the caller.
    pub fn policy_block_with_approval(
        reason: ReasonCode,
        source: Source,
        approval_id: Option<String>,
    ) -> Self {
        Self {
            approval_id,
            ..Self::policy_block(reason, source)
        }
    }
}
