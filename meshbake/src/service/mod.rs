//! Conversion orchestration.
//!
//! [`ConversionService`] ties the pieces together: it answers a request
//! for a job's asset from the result cache when possible, otherwise
//! fetches the archive, runs the pipeline on a blocking thread and stores
//! the result. Concurrent requests for the same job share one conversion.
//!
//! [`ConversionService::watch_job`] connects the service to a
//! [`JobWatcher`](crate::watcher::JobWatcher): the conversion starts when
//! the remote job completes.

mod artifact;
mod coalesce;
mod conversion;
mod error;

pub use artifact::AssetArtifact;
pub use coalesce::{CoalescerStats, RequestCoalescer};
pub use conversion::{ConversionService, DEFAULT_FETCH_TIMEOUT_SECS};
pub use error::ServiceError;
