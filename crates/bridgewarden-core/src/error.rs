//! Error types for the BridgeWarden core.

use thiserror::Error;

/// Core error type for tool-surface operations.
///
/// Policy outcomes are not errors: they come back inside a blocked
/// `GuardResult` or repo response. This type carries the genuine
/// failures the caller must handle.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Configuration parsing or validation failed.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// The guard pipeline's stores failed.
    #[error(transparent)]
    Guard(#[from] bridgewarden_guard::GuardError),

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] bridgewarden_store::StoreError),

    /// A network operation failed outside the converted policy paths.
    #[error(transparent)]
    Network(#[from] bridgewarden_fetch::NetworkError),

    /// Repository fetch or extraction failed.
    #[error(transparent)]
    Repo(#[from] bridgewarden_fetch::RepoError),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A quarantine operation was requested but no store is wired.
    #[error("quarantine store is not configured")]
    QuarantineUnavailable,

    /// An approval operation was requested but no store is wired.
    #[error("approval store is not configured")]
    ApprovalsUnavailable,
}
