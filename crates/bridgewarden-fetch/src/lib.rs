//! # BridgeWarden Fetch
//!
//! Network plumbing and the repository fetcher: bounded HTTP GETs, and
//! tarball extraction that feeds every file through the guard pipeline.
//!
//! ## Security Notes
//!
//! - All fetches are bounded: a byte budget travels with every request
//!   and every archive member read.
//! - The production HTTP client refuses cross-host redirects so an
//!   allowlisted host cannot bounce a fetch elsewhere.
//! - Extraction never writes outside `storage_dir/<repo_id>/<ref>/`.

mod http;
mod repo;

pub use http::{HttpClient, HttpGet, NetworkError};
pub use repo::{
    repo_id, sanitize_ref, ChangedFile, FileStatus, RepoError, RepoFetcher, RepoFinding,
    RepoLimits, RepoRequest, RepoScan, RepoSummary,
};
