//! HTTP plumbing for guarded fetches.
//!
//! The rest of the system depends only on the narrow [`HttpGet`]
//! contract; [`HttpClient`] is the production implementation. Tests
//! inject closures returning canned bytes, which keeps the fetch path
//! fully deterministic.

use std::io::Read;
use std::time::Duration;
use thiserror::Error;

/// User agent sent with every outbound request.
const USER_AGENT: &str = concat!("BridgeWarden/", env!("CARGO_PKG_VERSION"));

/// Errors from the network layer.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The caller asked for a non-positive byte budget.
    #[error("max_bytes must be positive")]
    InvalidMaxBytes,

    /// The HTTP request failed (connect, timeout, TLS, or a rejected
    /// cross-host redirect).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading the response body failed.
    #[error("network I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Narrow fetch contract: GET a URL, return at most `max_bytes` bytes.
/// Tests implement this over canned bytes to keep fetches deterministic.
pub trait HttpGet {
    /// Fetch up to `max_bytes` bytes from `url`.
    fn get(&self, url: &str, max_bytes: usize) -> Result<Vec<u8>, NetworkError>;
}

/// Production HTTP client with a fixed timeout.
///
/// Redirects are followed only within the original host: a redirect to a
/// different host aborts the request, so an allowlisted host cannot
/// bounce the fetcher somewhere that was never vetted.
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    /// Build a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, NetworkError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::custom(|attempt| {
                let original_host = attempt
                    .previous()
                    .first()
                    .and_then(|url| url.host_str())
                    .map(str::to_owned);
                let next_host = attempt.url().host_str().map(str::to_owned);
                if original_host == next_host {
                    attempt.follow()
                } else {
                    attempt.error("redirected to different host")
                }
            }))
            .build()?;
        Ok(Self { client })
    }

    /// Fetch up to `max_bytes` bytes from `url`. Responses larger than
    /// the budget are silently truncated at the budget, mirroring the
    /// bounded-read semantics of the archive path.
    pub fn get(&self, url: &str, max_bytes: usize) -> Result<Vec<u8>, NetworkError> {
        if max_bytes == 0 {
            return Err(NetworkError::InvalidMaxBytes);
        }
        let response = self.client.get(url).send()?.error_for_status()?;
        let mut buffer = Vec::new();
        response.take(max_bytes as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// Fetch and decode to UTF-8 text, replacing invalid sequences.
    pub fn get_text(&self, url: &str, max_bytes: usize) -> Result<String, NetworkError> {
        let payload = self.get(url, max_bytes)?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }
}

impl HttpGet for HttpClient {
    fn get(&self, url: &str, max_bytes: usize) -> Result<Vec<u8>, NetworkError> {
        HttpClient::get(self, url, max_bytes)
    }
}
