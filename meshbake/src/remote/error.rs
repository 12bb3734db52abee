//! Error types for remote job access.

use thiserror::Error;

/// Errors talking to the processing node.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The node could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other transport failure.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The node answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body was not what we expected.
    #[error("failed to parse response: {0}")]
    Json(String),

    /// The node reported an error for the job (unknown id, bad token, ...).
    #[error("remote error: {0}")]
    Api(String),

    /// The archive exceeds the configured maximum.
    #[error("archive too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },
}

impl RemoteError {
    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Timeout | RemoteError::Connect(_) => true,
            RemoteError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if e.is_connect() {
            RemoteError::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            RemoteError::Status {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else if e.is_decode() {
            RemoteError::Json(e.to_string())
        } else {
            RemoteError::Http(e.to_string())
        }
    }
}
