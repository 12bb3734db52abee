//! Watcher configuration.

use std::time::Duration;

/// Default time between status polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default timeout for a single status request.
pub const DEFAULT_STATUS_TIMEOUT_SECS: u64 = 30;

/// Default number of consecutive transient failures tolerated.
pub const DEFAULT_MAX_TRANSIENT_RETRIES: u32 = 5;

/// Configuration for [`JobWatcher`](super::JobWatcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// How often to poll the job status.
    pub poll_interval: Duration,

    /// Bound on a single status request.
    pub request_timeout: Duration,

    /// Consecutive transient failures retried before the watch gives up
    /// with [`WatchError::TransientPoll`](super::WatchError::TransientPoll).
    pub max_transient_retries: u32,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_STATUS_TIMEOUT_SECS),
            max_transient_retries: DEFAULT_MAX_TRANSIENT_RETRIES,
        }
    }
}
