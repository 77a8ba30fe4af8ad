use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ingest::RequestKind;

/// Root configuration, built once at startup and passed down explicitly.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PusherConfig {
    /// Base URL of the ingestion service, e.g. `http://localhost:8080/api/v1/roviqa`.
    #[serde(default)]
    pub base_url: String,
    /// Sent verbatim as the `Authorization` header.
    #[serde(default)]
    pub credential: String,
    /// What the uploaded files contain.
    #[serde(default = "default_kind")]
    pub kind: RequestKind,
    /// Maximum number of concurrent submissions.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Sleep between status polls and between submit retries (minutes).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,
    /// Submit attempts per file before giving up.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    /// Emit request/response detail in the logs.
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub input: InputConfig,
}

impl Default for PusherConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            credential: String::new(),
            kind: default_kind(),
            parallelism: default_parallelism(),
            poll_interval_minutes: default_poll_interval(),
            retry_count: default_retry_count(),
            http_timeout_secs: default_http_timeout(),
            verbose: false,
            input: InputConfig::default(),
        }
    }
}

fn default_kind() -> RequestKind {
    RequestKind::Viewership
}

fn default_parallelism() -> usize {
    20
}

fn default_poll_interval() -> u64 {
    1
}

fn default_retry_count() -> u32 {
    3
}

fn default_http_timeout() -> u64 {
    30
}

/// Which CSV files to upload. A directory takes precedence over a single file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Config safe to print (credential redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub base_url: String,
    pub credential_configured: bool,
    pub kind: RequestKind,
    pub parallelism: usize,
    pub poll_interval_minutes: u64,
    pub retry_count: u32,
    pub http_timeout_secs: u64,
    pub verbose: bool,
    pub input: InputConfig,
}

impl From<&PusherConfig> for SanitizedConfig {
    fn from(config: &PusherConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            credential_configured: !config.credential.is_empty(),
            kind: config.kind,
            parallelism: config.parallelism,
            poll_interval_minutes: config.poll_interval_minutes,
            retry_count: config.retry_count,
            http_timeout_secs: config.http_timeout_secs,
            verbose: config.verbose,
            input: config.input.clone(),
        }
    }
}
