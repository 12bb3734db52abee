//! Pipeline stage implementations.
//!
//! Each stage is a plain function taking the job key for log correlation.
//! Stages know nothing about work directories or each other; the runner in
//! [`convert_archive`](super::convert_archive) chains them.

mod assemble;
mod ingest;
mod relink;
mod transcode;

pub use assemble::assemble_stage;
pub use ingest::ingest_stage;
pub use relink::relink_stage;
pub use transcode::transcode_stage;
