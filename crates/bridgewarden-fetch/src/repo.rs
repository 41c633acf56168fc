//! # Repository Fetcher
//!
//! Downloads a repository tarball, extracts it under bounded limits, and
//! runs every regular file through the guard pipeline.
//!
//! ## Threat Model
//!
//! The extraction path defends against hostile archives:
//!
//! - **Archive bombs**: member reads are streamed with a per-file byte
//!   cap, the member list is truncated at `max_files`, and a running
//!   total of extracted bytes is gated by `max_repo_bytes`.
//! - **Path traversal**: member paths are joined lexically; any `..`,
//!   root, or prefix component aborts the fetch before a byte is
//!   written.
//! - **Ref smuggling**: the requested ref is sanitized to a short
//!   filesystem-safe token before it becomes a directory name.
//!
//! Findings preserve archive member order so repeated fetches of the
//! same archive produce byte-identical results.

use crate::http::HttpGet;
use bridgewarden_guard::{
    AuditSink, Decision, GuardPipeline, QuarantineSink, ReasonCode, Source,
};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from repository fetching and extraction.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Repo URL scheme is not http(s).
    #[error("unsupported repo scheme")]
    UnsupportedScheme,

    /// Repo host is not a supported archive host.
    #[error("unsupported repo host")]
    UnsupportedHost,

    /// URL does not name an owner/repository pair.
    #[error("invalid GitHub repo URL")]
    InvalidRepoUrl,

    /// A member path would resolve outside the repo root.
    #[error("path escapes repo root")]
    PathEscape,

    /// The decompressed archive exceeded the repo byte budget.
    #[error("archive exceeds repo byte budget")]
    ArchiveTooLarge,

    /// Archive or filesystem I/O failed.
    #[error("archive read error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive download failed.
    #[error(transparent)]
    Network(#[from] crate::http::NetworkError),

    /// The guard pipeline failed while scanning a member.
    #[error(transparent)]
    Guard(#[from] bridgewarden_guard::GuardError),
}

/// Byte and file-count limits for one fetch.
#[derive(Debug, Clone, Copy)]
pub struct RepoLimits {
    /// Cap on the downloaded archive and on total extracted bytes.
    pub max_repo_bytes: usize,
    /// Per-file cap; larger members are truncated and flagged.
    pub max_file_bytes: usize,
    /// Cap on the number of regular members considered.
    pub max_files: usize,
}

impl Default for RepoLimits {
    fn default() -> Self {
        Self {
            max_repo_bytes: 10 * 1024 * 1024,
            max_file_bytes: 256 * 1024,
            max_files: 2000,
        }
    }
}

/// Parameters for one repository fetch.
#[derive(Debug, Clone, Default)]
pub struct RepoRequest {
    pub url: String,
    pub ref_name: Option<String>,
    pub depth: Option<u32>,
    pub include_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub baseline_revision: Option<String>,
}

impl RepoRequest {
    /// A fetch of the default ref with no filters.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Per-file scan outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoFinding {
    pub path: String,
    pub decision: Decision,
    pub risk_score: f64,
    pub reasons: Vec<ReasonCode>,
    pub content_hash: String,
}

/// Aggregate counts over all findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub total: u64,
    pub allowed: u64,
    pub warned: u64,
    pub blocked: u64,
    pub cache_hits: u64,
}

/// Change status of an extracted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
}

/// One extracted file and its change status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
}

/// The result of scanning one repository revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoScan {
    pub repo_id: String,
    pub new_revision: String,
    pub changed_files: Vec<ChangedFile>,
    pub summary: RepoSummary,
    pub findings: Vec<RepoFinding>,
    pub quarantine_ids: Vec<String>,
}

/// Fetches a repo archive, stores its files, and scans each one through
/// the guard pipeline.
pub struct RepoFetcher<'a> {
    http_get: &'a dyn HttpGet,
    storage_dir: PathBuf,
    profile_name: String,
    quarantine: Option<&'a dyn QuarantineSink>,
    audit: Option<&'a dyn AuditSink>,
    limits: RepoLimits,
}

impl<'a> RepoFetcher<'a> {
    /// Create a fetcher writing under `storage_dir` and scanning with
    /// the named profile.
    pub fn new(
        http_get: &'a dyn HttpGet,
        storage_dir: impl Into<PathBuf>,
        profile_name: impl Into<String>,
    ) -> Self {
        Self {
            http_get,
            storage_dir: storage_dir.into(),
            profile_name: profile_name.into(),
            quarantine: None,
            audit: None,
            limits: RepoLimits::default(),
        }
    }

    /// Wire a quarantine sink for blocked members.
    pub fn with_quarantine(mut self, sink: &'a dyn QuarantineSink) -> Self {
        self.quarantine = Some(sink);
        self
    }

    /// Wire an audit sink receiving every member's result.
    pub fn with_audit(mut self, sink: &'a dyn AuditSink) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Override the default limits.
    pub fn with_limits(mut self, limits: RepoLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Fetch one revision and scan its files.
    pub fn fetch(&self, request: &RepoRequest) -> Result<RepoScan, RepoError> {
        let repo_id = repo_id(&request.url);
        let revision = sanitize_ref(request.ref_name.as_deref().unwrap_or("HEAD"));
        let archive_url = github_archive_url(&request.url, &revision)?;
        debug!(repo_id = %repo_id, revision = %revision, "fetching repo archive");

        let payload = self.http_get.get(&archive_url, self.limits.max_repo_bytes)?;
        let repo_root = self.storage_dir.join(&repo_id).join(&revision);
        fs::create_dir_all(&repo_root)?;

        let mut findings: Vec<RepoFinding> = Vec::new();
        let mut quarantine_ids: Vec<String> = Vec::new();
        let mut changed_files: Vec<ChangedFile> = Vec::new();
        let mut summary = RepoSummary::default();

        let decoder = GzDecoder::new(Cursor::new(payload));
        let mut archive = tar::Archive::new(decoder);

        let mut root_prefix: Option<String> = None;
        let mut regular_members = 0usize;
        let mut extracted_total = 0usize;

        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            regular_members += 1;
            if regular_members > self.limits.max_files {
                break;
            }

            let member_path: PathBuf = entry.path()?.into_owned();
            if root_prefix.is_none() {
                root_prefix = first_component(&member_path);
            }
            let rel_path = relative_path(&member_path, root_prefix.as_deref());
            if rel_path.is_empty() {
                continue;
            }
            if !path_allowed(&rel_path, &request.include_paths, &request.exclude_paths) {
                continue;
            }

            let (content, hash, truncated) = read_member(&mut entry, self.limits.max_file_bytes)?;
            extracted_total += content.len();
            if extracted_total > self.limits.max_repo_bytes {
                return Err(RepoError::ArchiveTooLarge);
            }

            let destination = safe_join(&repo_root, &rel_path)?;
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&destination, &content)?;

            if truncated {
                warn!(path = %rel_path, "member exceeded file byte cap, flagged");
                findings.push(RepoFinding {
                    path: rel_path.clone(),
                    decision: Decision::Block,
                    risk_score: 1.0,
                    reasons: vec![ReasonCode::FileTooLarge],
                    content_hash: hash,
                });
                summary.blocked += 1;
            } else {
                let text = String::from_utf8_lossy(&content).into_owned();
                let mut pipeline = GuardPipeline::new(&self.profile_name);
                if let Some(sink) = self.quarantine {
                    pipeline = pipeline.with_quarantine(sink);
                }
                if let Some(sink) = self.audit {
                    pipeline = pipeline.with_audit(sink);
                }
                let result = pipeline.guard(
                    &text,
                    Source::Repo {
                        url: request.url.clone(),
                        path: Some(rel_path.clone()),
                        repo_id: None,
                    },
                )?;
                debug!(path = %rel_path, decision = %result.decision, "scanned member");
                match result.decision {
                    Decision::Allow => summary.allowed += 1,
                    Decision::Warn => summary.warned += 1,
                    Decision::Block => {
                        summary.blocked += 1;
                        if let Some(id) = &result.quarantine_id {
                            quarantine_ids.push(id.clone());
                        }
                    }
                }
                findings.push(RepoFinding {
                    path: rel_path.clone(),
                    decision: result.decision,
                    risk_score: result.risk_score,
                    reasons: result.reasons,
                    content_hash: result.content_hash,
                });
            }

            changed_files.push(ChangedFile {
                path: rel_path,
                status: FileStatus::Added,
            });
        }

        summary.total = findings.len() as u64;
        Ok(RepoScan {
            repo_id,
            new_revision: revision,
            changed_files,
            summary,
            findings,
            quarantine_ids,
        })
    }
}

/// Deterministic repo id: `r_` plus the first 16 hex chars of the URL
/// hash.
pub fn repo_id(url: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
    format!("r_{}", &digest[..16])
}

/// Sanitize a ref name into a short filesystem-safe token. Anything
/// outside `[A-Za-z0-9._-]` becomes `_`, leading and trailing `._-` are
/// stripped, and degenerate results collapse to `HEAD`.
pub fn sanitize_ref(ref_name: &str) -> String {
    let replaced: String = ref_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stripped = replaced.trim_matches(|c| matches!(c, '.' | '_' | '-'));
    if matches!(stripped, "" | "." | "..") {
        return "HEAD".to_string();
    }
    stripped.chars().take(100).collect()
}

/// Build the codeload archive URL for a GitHub repository.
fn github_archive_url(repo_url: &str, ref_name: &str) -> Result<String, RepoError> {
    let parsed = url::Url::parse(repo_url).map_err(|_| RepoError::InvalidRepoUrl)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RepoError::UnsupportedScheme);
    }
    if parsed.host_str() != Some("github.com") {
        return Err(RepoError::UnsupportedHost);
    }
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    if segments.len() < 2 {
        return Err(RepoError::InvalidRepoUrl);
    }
    let owner = segments[0];
    let repo = segments[1].strip_suffix(".git").unwrap_or(segments[1]);
    Ok(format!(
        "https://codeload.github.com/{owner}/{repo}/tar.gz/{ref_name}"
    ))
}

/// First path component of a member path, if any.
fn first_component(path: &Path) -> Option<String> {
    path.components().find_map(|component| match component {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    })
}

/// Strip the archive root prefix and re-join with forward slashes.
fn relative_path(path: &Path, root_prefix: Option<&str>) -> String {
    let mut parts: Vec<String> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();
    if let (Some(prefix), Some(first)) = (root_prefix, parts.first()) {
        if first == prefix {
            parts.remove(0);
        }
    }
    parts.join("/")
}

/// Check include/exclude prefix filters. A path matches a prefix when it
/// equals the prefix or starts with `prefix + "/"`.
fn path_allowed(path: &str, include_paths: &[String], exclude_paths: &[String]) -> bool {
    let matches_prefix = |prefix: &String| {
        let trimmed = prefix.trim_end_matches('/');
        path == prefix || path.starts_with(&format!("{trimmed}/"))
    };
    if !include_paths.is_empty() && !include_paths.iter().any(matches_prefix) {
        return false;
    }
    if exclude_paths.iter().any(matches_prefix) {
        return false;
    }
    true
}

/// Stream-read a member: hash the full stream, cap the in-memory buffer.
fn read_member<R: Read>(
    reader: &mut R,
    max_bytes: usize,
) -> Result<(Vec<u8>, String, bool), RepoError> {
    let mut hasher = Sha256::new();
    let mut buffer: Vec<u8> = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];

    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        let data = &chunk[..read];
        hasher.update(data);
        if buffer.len() < max_bytes {
            let remaining = max_bytes - buffer.len();
            buffer.extend_from_slice(&data[..read.min(remaining)]);
            if read > remaining {
                truncated = true;
            }
        } else {
            truncated = true;
        }
    }

    Ok((buffer, format!("{:x}", hasher.finalize()), truncated))
}

/// Join lexically while refusing every component that could escape the
/// repo root.
fn safe_join(root: &Path, relative: &str) -> Result<PathBuf, RepoError> {
    let mut out = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return Err(RepoError::PathEscape),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_id_shape() {
        let id = repo_id("https://github.com/org/repo");
        assert!(id.starts_with("r_"));
        assert_eq!(id.len(), 18);
        assert_eq!(id, repo_id("https://github.com/org/repo"));
    }

    #[test]
    fn test_sanitize_ref_guards_path_traversal() {
        assert_eq!(sanitize_ref(".."), "HEAD");
        assert_eq!(sanitize_ref("../main"), "main");
        assert_eq!(sanitize_ref("feature/test"), "feature_test");
        assert_eq!(sanitize_ref(""), "HEAD");
        assert_eq!(sanitize_ref("v1.2.3"), "v1.2.3");
    }

    #[test]
    fn test_sanitize_ref_truncates() {
        let long = "x".repeat(200);
        assert_eq!(sanitize_ref(&long).len(), 100);
    }

    #[test]
    fn test_github_archive_url() {
        let url = github_archive_url("https://github.com/org/repo.git", "main").unwrap();
        assert_eq!(url, "https://codeload.github.com/org/repo/tar.gz/main");
    }

    #[test]
    fn test_archive_url_rejects_other_hosts() {
        assert!(matches!(
            github_archive_url("https://gitlab.com/org/repo", "main"),
            Err(RepoError::UnsupportedHost)
        ));
        assert!(matches!(
            github_archive_url("ftp://github.com/org/repo", "main"),
            Err(RepoError::UnsupportedScheme)
        ));
        assert!(matches!(
            github_archive_url("https://github.com/org", "main"),
            Err(RepoError::InvalidRepoUrl)
        ));
    }

    #[test]
    fn test_relative_path_strips_root_prefix() {
        let path = Path::new("repo-HEAD/src/lib.rs");
        assert_eq!(relative_path(path, Some("repo-HEAD")), "src/lib.rs");
        assert_eq!(relative_path(Path::new("repo-HEAD"), Some("repo-HEAD")), "");
        assert_eq!(relative_path(Path::new("other/file"), Some("repo-HEAD")), "other/file");
    }

    #[test]
    fn test_path_allowed_filters() {
        assert!(path_allowed("src/lib.rs", &[], &[]));
        assert!(path_allowed("src/lib.rs", &["src".to_string()], &[]));
        assert!(!path_allowed("docs/readme", &["src".to_string()], &[]));
        assert!(!path_allowed("src/lib.rs", &[], &["src".to_string()]));
        assert!(path_allowed("src", &["src".to_string()], &[]));
        assert!(path_allowed("src/lib.rs", &["src/".to_string()], &[]));
        // "srcfoo" must not match the "src" prefix.
        assert!(!path_allowed("srcfoo", &["src".to_string()], &[]));
    }

    #[test]
    fn test_safe_join_rejects_escapes() {
        let root = Path::new("/data/repos/r_x/HEAD");
        assert!(safe_join(root, "src/lib.rs").is_ok());
        assert!(matches!(safe_join(root, "../evil"), Err(RepoError::PathEscape)));
        assert!(matches!(safe_join(root, "a/../../evil"), Err(RepoError::PathEscape)));
        assert!(matches!(safe_join(root, "/etc/passwd"), Err(RepoError::PathEscape)));
    }

    #[test]
    fn test_read_member_caps_and_hashes_full_stream() {
        let data = vec![b'x'; 50];
        let mut cursor = std::io::Cursor::new(data.clone());
        let (content, hash, truncated) = read_member(&mut cursor, 10).unwrap();
        assert_eq!(content.len(), 10);
        assert!(truncated);
        // The hash covers the full stream, not the capped buffer.
        assert_eq!(hash, format!("{:x}", Sha256::digest(&data)));
    }

    #[test]
    fn test_read_member_small_file_untouched() {
        let mut cursor = std::io::Cursor::new(b"hello".to_vec());
        let (content, _, truncated) = read_member(&mut cursor, 1024).unwrap();
        assert_eq!(content, b"hello");
        assert!(!truncated);
    }
}
