//! Remote job collaborators.
//!
//! The watcher and the conversion service talk to the processing node
//! through two traits: [`JobStatusSource`] for polling a job's status and
//! [`ArchiveSource`] for downloading its packaged output. [`HttpJobClient`]
//! implements both over HTTP.

mod client;
mod config;
mod error;

pub use client::{ArchiveSource, HttpJobClient, JobStatusSource};
pub use config::{
    RemoteConfig, DEFAULT_ARCHIVE_NAME, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_MAX_ARCHIVE_BYTES, DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use error::RemoteError;
