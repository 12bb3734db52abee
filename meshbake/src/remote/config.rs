//! Configuration for the remote processing node.

use std::time::Duration;

/// Default processing node URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Archive requested from a finished job.
pub const DEFAULT_ARCHIVE_NAME: &str = "all.zip";

/// Default per-request timeout. Archive downloads use the same bound.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default upper bound on a downloaded archive (4 GiB).
pub const DEFAULT_MAX_ARCHIVE_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Connection settings for [`HttpJobClient`](super::HttpJobClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL of the processing node, without trailing slash.
    pub base_url: String,

    /// File name of the archive to download.
    pub archive_name: String,

    /// Total timeout for one HTTP request.
    pub request_timeout: Duration,

    pub connect_timeout: Duration,

    /// Archives larger than this are rejected.
    pub max_archive_bytes: u64,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Base URL with any trailing slashes removed.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_archive_bytes: DEFAULT_MAX_ARCHIVE_BYTES,
        }
    }
}
