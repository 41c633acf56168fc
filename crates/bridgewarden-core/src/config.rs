//! Configuration parsing and defaults.
//!
//! The config file is JSON (a JSON-compatible YAML subset). Parsing is
//! strict and stops at the first offending field with a human-readable
//! message; a missing file yields the defaults. Unknown keys are
//! ignored so configs can carry collaborator-specific sections.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

pub use bridgewarden_guard::{DEFAULT_PROFILE, POLICY_VERSION};

/// Raised when configuration parsing or validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Policy settings for source approvals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalPolicy {
    pub require_approval: bool,
    pub allowed_web_domains: Vec<String>,
    pub allowed_repo_urls: Vec<String>,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            require_approval: true,
            allowed_web_domains: Vec::new(),
            allowed_repo_urls: Vec::new(),
        }
    }
}

/// Controls network access and resource limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkPolicy {
    pub enabled: bool,
    pub timeout_seconds: f64,
    pub web_max_bytes: usize,
    pub repo_max_bytes: usize,
    pub repo_max_file_bytes: usize,
    pub repo_max_files: usize,
    pub allowed_web_hosts: Vec<String>,
    pub allowed_repo_hosts: Vec<String>,
    pub allow_localhost: bool,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_seconds: 10.0,
            web_max_bytes: 1024 * 1024,
            repo_max_bytes: 10 * 1024 * 1024,
            repo_max_file_bytes: 256 * 1024,
            repo_max_files: 2000,
            allowed_web_hosts: Vec::new(),
            allowed_repo_hosts: Vec::new(),
            allow_localhost: false,
        }
    }
}

/// Root configuration object, frozen after parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgewardenConfig {
    pub profile: String,
    pub approval_policy: ApprovalPolicy,
    pub network: NetworkPolicy,
}

impl Default for BridgewardenConfig {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            approval_policy: ApprovalPolicy::default(),
            network: NetworkPolicy::default(),
        }
    }
}

/// Load configuration from a file path. A missing file yields the
/// defaults; anything unreadable or malformed is an error.
pub fn load_config(path: &Path) -> Result<BridgewardenConfig, ConfigError> {
    if !path.exists() {
        return Ok(BridgewardenConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|err| ConfigError::new(format!("cannot read config: {err}")))?;
    let data: Value = serde_json::from_str(&raw)
        .map_err(|_| ConfigError::new("config must be JSON-compatible YAML"))?;
    config_from_value(&data)
}

/// Parse configuration from an already-decoded JSON value.
pub fn config_from_value(data: &Value) -> Result<BridgewardenConfig, ConfigError> {
    let root = data
        .as_object()
        .ok_or_else(|| ConfigError::new("config must be a JSON object"))?;

    let profile = match root.get("profile") {
        None => DEFAULT_PROFILE.to_string(),
        Some(Value::String(value)) => value.clone(),
        Some(_) => return Err(ConfigError::new("profile must be a string")),
    };

    let approvals = section(root.get("approvals"), "approvals must be an object")?;
    let require_approval = as_bool(
        approvals.get("require_approval"),
        true,
        "approvals.require_approval",
    )?;
    let allowed_web_domains = as_string_list(approvals.get("allowed_web_domains"))?;
    let allowed_repo_urls = as_string_list(approvals.get("allowed_repo_urls"))?;

    let network = section(root.get("network"), "network must be an object")?;
    let defaults = NetworkPolicy::default();
    let enabled = as_bool(network.get("enabled"), false, "network.enabled")?;
    let timeout_seconds = as_positive_number(
        network.get("timeout_seconds"),
        defaults.timeout_seconds,
        "network.timeout_seconds",
    )?;
    let web_max_bytes = as_positive_int(
        network.get("web_max_bytes"),
        defaults.web_max_bytes,
        "network.web_max_bytes",
    )?;
    let repo_max_bytes = as_positive_int(
        network.get("repo_max_bytes"),
        defaults.repo_max_bytes,
        "network.repo_max_bytes",
    )?;
    let repo_max_file_bytes = as_positive_int(
        network.get("repo_max_file_bytes"),
        defaults.repo_max_file_bytes,
        "network.repo_max_file_bytes",
    )?;
    let repo_max_files = as_positive_int(
        network.get("repo_max_files"),
        defaults.repo_max_files,
        "network.repo_max_files",
    )?;
    let allowed_web_hosts = as_string_list(network.get("allowed_web_hosts"))?;
    let allowed_repo_hosts = as_string_list(network.get("allowed_repo_hosts"))?;
    let allow_localhost = as_bool(network.get("allow_localhost"), false, "network.allow_localhost")?;

    Ok(BridgewardenConfig {
        profile,
        approval_policy: ApprovalPolicy {
            require_approval,
            allowed_web_domains,
            allowed_repo_urls,
        },
        network: NetworkPolicy {
            enabled,
            timeout_seconds,
            web_max_bytes,
            repo_max_bytes,
            repo_max_file_bytes,
            repo_max_files,
            allowed_web_hosts,
            allowed_repo_hosts,
            allow_localhost,
        },
    })
}

/// A missing or null section parses as empty; anything else must be an
/// object.
fn section<'a>(
    value: Option<&'a Value>,
    message: &str,
) -> Result<std::borrow::Cow<'a, serde_json::Map<String, Value>>, ConfigError> {
    match value {
        None | Some(Value::Null) => Ok(std::borrow::Cow::Owned(serde_json::Map::new())),
        Some(Value::Object(map)) => Ok(std::borrow::Cow::Borrowed(map)),
        Some(_) => Err(ConfigError::new(message)),
    }
}

fn as_bool(value: Option<&Value>, default: bool, name: &str) -> Result<bool, ConfigError> {
    match value {
        None => Ok(default),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(_) => Err(ConfigError::new(format!("{name} must be a boolean"))),
    }
}

fn as_string_list(value: Option<&Value>) -> Result<Vec<String>, ConfigError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ConfigError::new("expected a list of strings"))
            })
            .collect(),
        Some(_) => Err(ConfigError::new("expected a list of strings")),
    }
}

fn as_positive_int(value: Option<&Value>, default: usize, name: &str) -> Result<usize, ConfigError> {
    match value {
        None => Ok(default),
        Some(Value::Number(number)) if number.is_u64() || number.is_i64() => {
            let parsed = number
                .as_i64()
                .ok_or_else(|| ConfigError::new(format!("{name} must be an integer")))?;
            if parsed <= 0 {
                return Err(ConfigError::new(format!("{name} must be positive")));
            }
            Ok(parsed as usize)
        }
        Some(_) => Err(ConfigError::new(format!("{name} must be an integer"))),
    }
}

fn as_positive_number(value: Option<&Value>, default: f64, name: &str) -> Result<f64, ConfigError> {
    match value {
        None => Ok(default),
        Some(Value::Number(number)) => {
            let parsed = number
                .as_f64()
                .ok_or_else(|| ConfigError::new(format!("{name} must be a number")))?;
            if parsed <= 0.0 {
                return Err(ConfigError::new(format!("{name} must be positive")));
            }
            Ok(parsed)
        }
        Some(_) => Err(ConfigError::new(format!("{name} must be a number"))),
    }
}
