//! # Tool Surface
//!
//! Policy-gated endpoints over the guard pipeline, the stores, and the
//! repo fetcher. Every gate failure is encoded as a BLOCK result with a
//! single reason code rather than an error: callers always receive a
//! well-formed response they can forward.
//!
//! ## Gate Order
//!
//! ```text
//! bw_read_file:  repo_id -> path traversal -> mode -> existence -> pipeline
//! bw_web_fetch:  url normalize -> scheme -> network enabled -> host
//!                allowlist -> SSRF -> approval -> fetcher -> mode ->
//!                max_bytes -> fetch -> pipeline
//! bw_fetch_repo: network enabled -> host allowlist (repo + archive
//!                host) -> approval -> fetcher -> delegate
//! ```
//!
//! ## Security Notes
//!
//! - Transport failures never propagate: a failing web fetcher becomes
//!   `NETWORK_ERROR`, a failing repo fetcher becomes `REPO_FETCH_FAILED`.
//! - The approval gate mints a PENDING request on first contact with an
//!   unapproved source and surfaces the new approval id in the block.

use crate::config::BridgewardenConfig;
use crate::error::WardenError;
use crate::ssrf::{is_ssrf_risk, normalize_host, DnsResolve, SystemResolver};
use crate::urlnorm::normalize_raw_file_url;

use bridgewarden_fetch::{
    ChangedFile, NetworkError, RepoError, RepoFetcher, RepoFinding, RepoRequest, RepoScan,
    RepoSummary,
};
use bridgewarden_guard::{
    GuardPipeline, GuardResult, ReasonCode, Source,
};
use bridgewarden_store::{
    ApprovalKind, ApprovalOutcome, ApprovalRecord, ApprovalRequest, ApprovalStatus, ApprovalStore,
    AuditLogger, QuarantineStore, QuarantineView,
};

use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::warn;
use url::Url;

/// Web fetch seam: fetch a URL and return decoded text. Tests implement
/// this over canned responses.
pub trait WebFetch {
    fn fetch_text(&self, url: &str, max_bytes: usize) -> Result<String, NetworkError>;
}

impl WebFetch for bridgewarden_fetch::HttpClient {
    fn fetch_text(&self, url: &str, max_bytes: usize) -> Result<String, NetworkError> {
        self.get_text(url, max_bytes)
    }
}

/// Repo fetch seam: fetch and scan one repository revision.
pub trait RepoFetch {
    fn fetch(&self, request: &RepoRequest) -> Result<RepoScan, RepoError>;
}

impl RepoFetch for RepoFetcher<'_> {
    fn fetch(&self, request: &RepoRequest) -> Result<RepoScan, RepoError> {
        RepoFetcher::fetch(self, request)
    }
}

/// Repo fetch response: a successful scan, or a policy block carrying
/// its reasons and source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoFetchResponse {
    pub repo_id: Option<String>,
    pub new_revision: Option<String>,
    pub changed_files: Vec<ChangedFile>,
    pub summary: RepoSummary,
    pub findings: Vec<RepoFinding>,
    pub quarantine_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

impl From<RepoScan> for RepoFetchResponse {
    fn from(scan: RepoScan) -> Self {
        Self {
            repo_id: Some(scan.repo_id),
            new_revision: Some(scan.new_revision),
            changed_files: scan.changed_files,
            summary: scan.summary,
            findings: scan.findings,
            quarantine_ids: scan.quarantine_ids,
            approval_id: None,
            reasons: Vec::new(),
            source: None,
        }
    }
}

impl RepoFetchResponse {
    fn blocked(source: Source, reason: ReasonCode, approval_id: Option<String>) -> Self {
        Self {
            repo_id: None,
            new_revision: None,
            changed_files: Vec::new(),
            summary: RepoSummary {
                total: 0,
                allowed: 0,
                warned: 0,
                blocked: 1,
                cache_hits: 0,
            },
            findings: Vec::new(),
            quarantine_ids: Vec::new(),
            approval_id,
            reasons: vec![reason],
            source: Some(source),
        }
    }

    /// Returns true when this response is a policy block.
    pub fn is_blocked(&self) -> bool {
        !self.reasons.is_empty()
    }
}

/// Per-call tool handlers borrowing the stores and configuration.
///
/// Nothing here is owned beyond the base directory; handlers are cheap
/// to build per request, which keeps the core free of shared mutable
/// state.
pub struct ToolHandlers<'a> {
    config: &'a BridgewardenConfig,
    base_dir: PathBuf,
    quarantine: Option<&'a QuarantineStore>,
    approvals: Option<&'a ApprovalStore>,
    audit: Option<&'a AuditLogger>,
    resolver: Option<&'a dyn DnsResolve>,
    web_fetcher: Option<&'a dyn WebFetch>,
    repo_fetcher: Option<&'a dyn RepoFetch>,
    profile_override: Option<String>,
}

impl<'a> ToolHandlers<'a> {
    /// Handlers with only config and a base directory; stores and
    /// fetchers are wired with the builder methods.
    pub fn new(config: &'a BridgewardenConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base_dir: base_dir.into(),
            quarantine: None,
            approvals: None,
            audit: None,
            resolver: None,
            web_fetcher: None,
            repo_fetcher: None,
            profile_override: None,
        }
    }

    pub fn with_quarantine(mut self, store: &'a QuarantineStore) -> Self {
        self.quarantine = Some(store);
        self
    }

    pub fn with_approvals(mut self, store: &'a ApprovalStore) -> Self {
        self.approvals = Some(store);
        self
    }

    pub fn with_audit(mut self, logger: &'a AuditLogger) -> Self {
        self.audit = Some(logger);
        self
    }

    pub fn with_resolver(mut self, resolver: &'a dyn DnsResolve) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_web_fetcher(mut self, fetcher: &'a dyn WebFetch) -> Self {
        self.web_fetcher = Some(fetcher);
        self
    }

    pub fn with_repo_fetcher(mut self, fetcher: &'a dyn RepoFetch) -> Self {
        self.repo_fetcher = Some(fetcher);
        self
    }

    /// Override the config profile for this call.
    pub fn with_profile(mut self, profile_name: impl Into<String>) -> Self {
        self.profile_override = Some(profile_name.into());
        self
    }

    fn profile_name(&self) -> &str {
        self.profile_override.as_deref().unwrap_or(&self.config.profile)
    }

    fn pipeline(&self) -> GuardPipeline<'_> {
        let mut pipeline = GuardPipeline::new(self.profile_name());
        if let Some(store) = self.quarantine {
            pipeline = pipeline.with_quarantine(store);
        }
        if let Some(logger) = self.audit {
            pipeline = pipeline.with_audit(logger);
        }
        pipeline
    }

    /// Read a local file and run it through the guard pipeline.
    pub fn read_file(
        &self,
        path: &str,
        repo_id: Option<&str>,
        mode: &str,
    ) -> Result<GuardResult, WardenError> {
        if let Some(repo_id) = repo_id {
            return Ok(GuardResult::policy_block(
                ReasonCode::RepoIdUnsupported,
                Source::Repo {
                    url: String::new(),
                    path: None,
                    repo_id: Some(repo_id.to_string()),
                },
            ));
        }

        let source = Source::File { path: path.to_string() };
        let Some(resolved) = safe_path(&self.base_dir, path) else {
            warn!(path = %path, "blocked path traversal attempt");
            return Ok(GuardResult::policy_block(ReasonCode::PathTraversal, source));
        };

        match mode {
            "safe" => {}
            "raw" => {
                return Ok(GuardResult::policy_block(ReasonCode::RawModeNotAllowed, source))
            }
            _ => return Ok(GuardResult::policy_block(ReasonCode::InvalidMode, source)),
        }

        if !resolved.is_file() {
            return Ok(GuardResult::policy_block(ReasonCode::FileNotFound, source));
        }

        let bytes = std::fs::read(&resolved)?;
        let text = String::from_utf8_lossy(&bytes);
        let source = Source::File { path: resolved.display().to_string() };
        Ok(self.pipeline().guard(&text, source)?)
    }

    /// Fetch web content through the configured fetcher and guard it.
    pub fn web_fetch(
        &self,
        url: &str,
        mode: &str,
        max_bytes: Option<i64>,
    ) -> Result<GuardResult, WardenError> {
        let resolved_url = normalize_raw_file_url(url);
        let parsed = Url::parse(&resolved_url).ok();
        let domain = normalize_host(
            parsed.as_ref().and_then(|p| p.host_str()).unwrap_or(""),
        );
        let source = Source::Web {
            url: url.to_string(),
            domain: domain.clone(),
            resolved_url: (resolved_url != url).then(|| resolved_url.clone()),
        };

        let scheme_ok = parsed
            .as_ref()
            .is_some_and(|p| matches!(p.scheme(), "http" | "https"));
        if !scheme_ok {
            return Ok(GuardResult::policy_block(ReasonCode::UnsupportedUrlScheme, source));
        }

        if !self.config.network.enabled {
            return Ok(GuardResult::policy_block(ReasonCode::NetworkDisabled, source));
        }

        if !host_allowed(&self.config.network.allowed_web_hosts, &domain) {
            return Ok(GuardResult::policy_block(ReasonCode::NetworkHostBlocked, source));
        }

        let resolver: &dyn DnsResolve = self.resolver.unwrap_or(&SystemResolver);
        if is_ssrf_risk(
            parsed.as_ref().and_then(|p| p.host_str()),
            resolver,
            self.config.network.allow_localhost,
        ) {
            warn!(domain = %domain, "blocked SSRF-risky fetch target");
            return Ok(GuardResult::policy_block(ReasonCode::SsrfBlocked, source));
        }

        let allowlisted = self
            .config
            .approval_policy
            .allowed_web_domains
            .iter()
            .any(|entry| normalize_host(entry) == domain);
        if let Err(approval_id) = self.approval_gate(ApprovalKind::WebDomain, &domain, allowlisted)? {
            return Ok(GuardResult::policy_block_with_approval(
                ReasonCode::NewSourceRequiresApproval,
                source,
                approval_id,
            ));
        }

        let Some(fetcher) = self.web_fetcher else {
            return Ok(GuardResult::policy_block(ReasonCode::NetworkDisabled, source));
        };

        if !matches!(mode, "readable_text" | "raw_text") {
            return Ok(GuardResult::policy_block(ReasonCode::InvalidMode, source));
        }

        if matches!(max_bytes, Some(value) if value <= 0) {
            return Ok(GuardResult::policy_block(ReasonCode::InvalidMaxBytes, source));
        }

        let requested = max_bytes
            .map(|value| value as usize)
            .unwrap_or(self.config.network.web_max_bytes);
        let limit = requested.min(self.config.network.web_max_bytes);

        let text = match fetcher.fetch_text(&resolved_url, limit) {
            Ok(text) => text,
            Err(err) => {
                warn!(url = %resolved_url, error = %err, "web fetch failed");
                return Ok(GuardResult::policy_block(ReasonCode::NetworkError, source));
            }
        };

        Ok(self.pipeline().guard(&text, source)?)
    }

    /// Fetch and scan a repository through the configured fetcher.
    pub fn fetch_repo(&self, request: &RepoRequest) -> Result<RepoFetchResponse, WardenError> {
        let source = Source::Repo {
            url: request.url.clone(),
            path: None,
            repo_id: None,
        };
        let host = normalize_host(
            Url::parse(&request.url)
                .ok()
                .and_then(|p| p.host_str().map(str::to_string))
                .as_deref()
                .unwrap_or(""),
        );

        if !self.config.network.enabled {
            return Ok(RepoFetchResponse::blocked(source, ReasonCode::NetworkDisabled, None));
        }

        if !host_allowed(&self.config.network.allowed_repo_hosts, &host) {
            return Ok(RepoFetchResponse::blocked(source, ReasonCode::NetworkHostBlocked, None));
        }
        let archive_host = repo_archive_host(&host);
        if archive_host != host && !host_allowed(&self.config.network.allowed_repo_hosts, &archive_host)
        {
            return Ok(RepoFetchResponse::blocked(source, ReasonCode::NetworkHostBlocked, None));
        }

        let allowlisted = self
            .config
            .approval_policy
            .allowed_repo_urls
            .iter()
            .any(|entry| entry == &request.url);
        if let Err(approval_id) =
            self.approval_gate(ApprovalKind::RepoUrl, &request.url, allowlisted)?
        {
            return Ok(RepoFetchResponse::blocked(
                source,
                ReasonCode::NewSourceRequiresApproval,
                approval_id,
            ));
        }

        let Some(fetcher) = self.repo_fetcher else {
            return Ok(RepoFetchResponse::blocked(source, ReasonCode::NetworkDisabled, None));
        };

        match fetcher.fetch(request) {
            Ok(scan) => Ok(scan.into()),
            Err(err) => {
                warn!(url = %request.url, error = %err, "repo fetch failed");
                Ok(RepoFetchResponse::blocked(source, ReasonCode::RepoFetchFailed, None))
            }
        }
    }

    /// Fetch a sanitized quarantine view for review.
    pub fn quarantine_get(
        &self,
        quarantine_id: &str,
        excerpt_limit: usize,
    ) -> Result<QuarantineView, WardenError> {
        let store = self.quarantine.ok_or(WardenError::QuarantineUnavailable)?;
        Ok(store.get_view(quarantine_id, excerpt_limit)?)
    }

    /// Create a new source approval request.
    pub fn request_source_approval(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalRecord, WardenError> {
        let store = self.approvals.ok_or(WardenError::ApprovalsUnavailable)?;
        Ok(store.request(request)?)
    }

    /// Fetch a single source approval record.
    pub fn get_source_approval(&self, approval_id: &str) -> Result<ApprovalRecord, WardenError> {
        let store = self.approvals.ok_or(WardenError::ApprovalsUnavailable)?;
        Ok(store.get(approval_id)?)
    }

    /// List source approvals with optional filters.
    pub fn list_source_approvals(
        &self,
        status: Option<ApprovalStatus>,
        kind: Option<ApprovalKind>,
        limit: usize,
    ) -> Result<Vec<ApprovalRecord>, WardenError> {
        let store = self.approvals.ok_or(WardenError::ApprovalsUnavailable)?;
        Ok(store.list(status, kind, limit)?)
    }

    /// Approve or deny a pending source approval request.
    pub fn decide_source_approval(
        &self,
        approval_id: &str,
        outcome: ApprovalOutcome,
        notes: Option<&str>,
        decided_by: Option<&str>,
    ) -> Result<ApprovalRecord, WardenError> {
        let store = self.approvals.ok_or(WardenError::ApprovalsUnavailable)?;
        Ok(store.decide(approval_id, outcome, notes, decided_by)?)
    }

    /// The approval gate shared by web and repo fetches.
    ///
    /// `Ok(Ok(()))` means the fetch may proceed. `Ok(Err(approval_id))`
    /// means the source needs approval: a PENDING request was minted
    /// when a store is wired, and its id rides along.
    fn approval_gate(
        &self,
        kind: ApprovalKind,
        target: &str,
        allowlisted: bool,
    ) -> Result<Result<(), Option<String>>, WardenError> {
        if allowlisted || !self.config.approval_policy.require_approval {
            return Ok(Ok(()));
        }
        let Some(store) = self.approvals else {
            return Ok(Err(None));
        };
        if store.is_approved(kind, target)? {
            return Ok(Ok(()));
        }
        let approval = store.request(&ApprovalRequest {
            kind,
            target: target.to_string(),
            rationale: None,
            requested_by: None,
        })?;
        Ok(Err(Some(approval.approval_id)))
    }
}

/// Non-empty allowlist membership over normalized hosts.
fn host_allowed(allowlist: &[String], host: &str) -> bool {
    if allowlist.is_empty() {
        return false;
    }
    allowlist.iter().any(|entry| normalize_host(entry) == host)
}

/// The archive host actually contacted for a repo host.
fn repo_archive_host(host: &str) -> String {
    if host == "github.com" {
        "codeload.github.com".to_string()
    } else {
        host.to_string()
    }
}

/// Resolve `relative` under `base` lexically, refusing any step that
/// leaves the base directory.
fn safe_path(base: &Path, relative: &str) -> Option<PathBuf> {
    let mut resolved = base.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() || !resolved.starts_with(base) {
                    return None;
                }
            }
            _ => return None,
        }
        if !resolved.starts_with(base) {
            return None;
        }
    }
    Some(resolved)
}
