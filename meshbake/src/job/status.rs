//! Job status vocabulary and the fixed numeric code table.

use std::fmt;

/// Status of a remote job.
///
/// Derived deterministically from the remote numeric status code via
/// [`JobStatus::from_code`]. Codes outside the table map to
/// [`JobStatus::Unknown`], which is never terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Waiting for a processing slot.
    Queued,
    /// Processing.
    Running,
    /// Processing failed.
    Failed,
    /// Processing finished and outputs are available.
    Completed,
    /// Cancelled by a user or the remote node.
    Canceled,
    /// Status code not in the table.
    #[default]
    Unknown,
}

impl JobStatus {
    pub const QUEUED_CODE: i64 = 10;
    pub const RUNNING_CODE: i64 = 20;
    pub const FAILED_CODE: i64 = 30;
    pub const COMPLETED_CODE: i64 = 40;
    pub const CANCELED_CODE: i64 = 50;

    /// Maps a remote status code onto the closed status set.
    pub fn from_code(code: i64) -> Self {
        match code {
            Self::QUEUED_CODE => Self::Queued,
            Self::RUNNING_CODE => Self::Running,
            Self::FAILED_CODE => Self::Failed,
            Self::COMPLETED_CODE => Self::Completed,
            Self::CANCELED_CODE => Self::Canceled,
            _ => Self::Unknown,
        }
    }

    /// Returns the remote code for this status, if it has one.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Queued => Some(Self::QUEUED_CODE),
            Self::Running => Some(Self::RUNNING_CODE),
            Self::Failed => Some(Self::FAILED_CODE),
            Self::Completed => Some(Self::COMPLETED_CODE),
            Self::Canceled => Some(Self::CANCELED_CODE),
            Self::Unknown => None,
        }
    }

    /// Returns true if no further transition can happen.
    ///
    /// Terminal states are: Completed, Failed, Canceled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }

    /// Returns true if the job finished successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "Queued"),
            Self::Running => write!(f, "Running"),
            Self::Failed => write!(f, "Failed"),
            Self::Completed => write!(f, "Completed"),
            Self::Canceled => write!(f, "Canceled"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A remote job as reported by the status source.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteJob {
    /// Remote job identifier.
    pub job_id: String,
    /// Raw numeric status code.
    pub status_code: i64,
    /// Progress percentage (0-100).
    pub progress: u8,
}

impl RemoteJob {
    /// Creates a remote job record, clamping progress into 0-100.
    pub fn new(job_id: impl Into<String>, status_code: i64, progress: f64) -> Self {
        let progress = if progress.is_finite() {
            progress.round().clamp(0.0, 100.0) as u8
        } else {
            0
        };

        Self {
            job_id: job_id.into(),
            status_code,
            progress,
        }
    }

    /// Returns the mapped status.
    pub fn status(&self) -> JobStatus {
        JobStatus::from_code(self.status_code)
    }
}
