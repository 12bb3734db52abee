//! Remote job model.
//!
//! Types describing a photogrammetry job as observed from this side of the
//! wire: its status vocabulary, the key used to scope results, the opaque
//! credentials attached to remote calls, and the free-form options blob.

mod credential;
mod key;
mod options;
mod status;

pub use credential::Credential;
pub use key::{JobKey, JobKeyError};
pub use options::{JobOptions, OptionsShape};
pub use status::{JobStatus, RemoteJob};
