//! Remote job status watcher.
//!
//! Polls a job on the processing node until it reaches a terminal status,
//! then fires a completion callback exactly once. Each watch runs as its
//! own task with its own cancellation token; watches share nothing
//! mutable, so any number of jobs can be followed at once.
//!
//! # Example
//!
//! ```ignore
//! let watcher = JobWatcher::new(client, WatcherConfig::default());
//! let handle = watcher.watch("3f2a", credential, |job| async move {
//!     convert(job).await
//! });
//! let converted = handle.wait().await?;
//! ```

mod config;
mod error;
mod watch;

pub use config::{
    WatcherConfig, DEFAULT_MAX_TRANSIENT_RETRIES, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_STATUS_TIMEOUT_SECS,
};
pub use error::WatchError;
pub use watch::{JobWatcher, WatchEvent, WatchHandle};
