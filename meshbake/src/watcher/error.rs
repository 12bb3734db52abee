use crate::remote::RemoteError;
use thiserror::Error;

/// Ways a watch can end without a completed job.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Too many consecutive transient poll failures. The job's state is
    /// unknown, not failed; the watch may be restarted.
    #[error("status polling failed {attempts} times in a row: {last_error}")]
    TransientPoll { attempts: u32, last_error: String },

    /// The node reported the job as failed.
    #[error("job {job_id} failed at {progress}%")]
    JobFailed { job_id: String, progress: u8 },

    /// The job was canceled on the node.
    #[error("job {job_id} was canceled")]
    JobCanceled { job_id: String },

    /// A non-retryable error from the node.
    #[error("status request rejected: {0}")]
    Remote(#[source] RemoteError),

    /// The watch was cancelled locally.
    #[error("watch cancelled")]
    Cancelled,

    /// The watch task ended abnormally.
    #[error("watch task failed: {0}")]
    Internal(String),
}

impl WatchError {
    /// The job itself reached a terminal non-success status.
    pub fn is_job_terminal(&self) -> bool {
        matches!(self, WatchError::JobFailed { .. } | WatchError::JobCanceled { .. })
    }
}
