use crate::cache::CacheError;
use crate::job::JobKey;
use crate::pipeline::PipelineError;
use crate::remote::RemoteError;
use crate::watcher::WatchError;
use std::time::Duration;
use thiserror::Error;

/// Errors from the conversion service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The conversion itself failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("job {job}: archive download failed: {source}")]
    Fetch {
        job: JobKey,
        #[source]
        source: RemoteError,
    },

    #[error("job {job}: archive download timed out after {timeout:?}")]
    FetchTimeout { job: JobKey, timeout: Duration },

    #[error("job {job}: result cache error: {source}")]
    Cache {
        job: JobKey,
        #[source]
        source: CacheError,
    },

    /// The job never completed (failed, canceled, or polling gave up).
    #[error("job {job}: {source}")]
    Watch {
        job: JobKey,
        #[source]
        source: WatchError,
    },

    /// A concurrent conversion of the same job, which this request was
    /// waiting on, failed.
    #[error("job {job}: shared conversion failed: {message}")]
    Coalesced { job: JobKey, message: String },

    /// A blocking task panicked or was aborted.
    #[error("internal error: {0}")]
    Internal(String),
}
