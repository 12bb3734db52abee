//! Job key scoping results by project.

use std::fmt;
use thiserror::Error;

/// Errors constructing a [`JobKey`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobKeyError {
    /// A component was empty.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// A component cannot be used as a single path segment.
    #[error("{field} '{value}' is not a valid identifier")]
    InvalidSegment { field: &'static str, value: String },
}

/// Identifies one job's result: a remote job id scoped by its project id.
///
/// Both components end up as path segments in the result cache, so they are
/// validated on construction: no separators, no dot-segments, no control
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    project_id: String,
    job_id: String,
}

impl JobKey {
    /// Creates a key after validating both components.
    pub fn new(
        project_id: impl Into<String>,
        job_id: impl Into<String>,
    ) -> Result<Self, JobKeyError> {
        let project_id = validate_segment("project_id", project_id.into())?;
        let job_id = validate_segment("job_id", job_id.into())?;
        Ok(Self { project_id, job_id })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_id, self.job_id)
    }
}

fn validate_segment(field: &'static str, value: String) -> Result<String, JobKeyError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(JobKeyError::Empty { field });
    }

    let invalid = trimmed.starts_with('.')
        || trimmed
            .chars()
            .any(|c| c == '/' || c == '\\' || c == ':' || c.is_control());
    if invalid {
        return Err(JobKeyError::InvalidSegment { field, value });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_key() {
        let key = JobKey::new("42", "3f2a-bc19").unwrap();
        assert_eq!(key.project_id(), "42");
        assert_eq!(key.job_id(), "3f2a-bc19");
        assert_eq!(key.to_string(), "42/3f2a-bc19");
    }

    #[test]
    fn test_trims_whitespace() {
        let key = JobKey::new(" 7 ", "job ").unwrap();
        assert_eq!(key.project_id(), "7");
        assert_eq!(key.job_id(), "job");
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(
            JobKey::new("", "job").unwrap_err(),
            JobKeyError::Empty { field: "project_id" }
        );
        assert_eq!(
            JobKey::new("p", "  ").unwrap_err(),
            JobKeyError::Empty { field: "job_id" }
        );
    }

    #[test]
    fn test_rejects_path_tricks() {
        for bad in ["..", "../etc", "a/b", "a\\b", ".hidden", "c:x", "a\0b"] {
            assert!(
                matches!(
                    JobKey::new("p", bad),
                    Err(JobKeyError::InvalidSegment { .. })
                ),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
