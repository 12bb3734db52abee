//! CLI command implementations.
//!
//! - [`convert`] - Offline conversion of a local archive
//! - [`watch`] - Watch a remote job and convert it on completion
//! - [`cache`] - Result cache inspection
//! - [`config`] - Configuration management

pub mod cache;
pub mod common;
pub mod config;
pub mod convert;
pub mod watch;
