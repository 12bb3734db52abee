//! Error types for the conversion pipeline.
//!
//! Stage functions fail with a [`StageError`]; the runner wraps it into a
//! [`PipelineError`] carrying the job key and the failing [`Stage`].

use crate::archive::{ArchiveError, RelinkError};
use crate::glb::AssembleError;
use crate::job::JobKey;
use std::fmt;
use thiserror::Error;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Work directory setup.
    Prepare,
    Ingest,
    Relink,
    Transcode,
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Prepare => "prepare",
            Stage::Ingest => "ingest",
            Stage::Relink => "relink",
            Stage::Transcode => "transcode",
            Stage::Assemble => "assemble",
        };
        f.write_str(name)
    }
}

/// Errors raised by individual stages.
#[derive(Debug, Error)]
pub enum StageError {
    /// The archive is unreadable or has no mesh.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The mesh is not text.
    #[error(transparent)]
    Relink(#[from] RelinkError),

    /// Geometry could not be turned into a GLB.
    #[error("conversion failed: {0}")]
    Conversion(#[from] AssembleError),

    /// Work directory I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A failed conversion: which job, which stage, and why.
#[derive(Debug, Error)]
#[error("job {job} failed in {stage} stage: {source}")]
pub struct PipelineError {
    pub job: JobKey,
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn new(job: &JobKey, stage: Stage, source: impl Into<StageError>) -> Self {
        Self {
            job: job.clone(),
            stage,
            source: source.into(),
        }
    }

    /// True when the archive had no mesh entry.
    pub fn is_missing_mesh(&self) -> bool {
        matches!(
            self.source,
            StageError::Archive(ArchiveError::MissingMesh { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_job_and_stage() {
        let key = JobKey::new("7", "abc").unwrap();
        let err = PipelineError::new(
            &key,
            Stage::Ingest,
            ArchiveError::MissingMesh {
                extension: ".obj".into(),
            },
        );
        assert_eq!(
            err.to_string(),
            "job 7/abc failed in ingest stage: archive contains no .obj mesh"
        );
        assert!(err.is_missing_mesh());
    }

    #[test]
    fn test_conversion_error_wraps_cause() {
        let err = StageError::from(AssembleError::MalformedGeometry {
            line: 3,
            reason: "bad".into(),
        });
        assert_eq!(
            err.to_string(),
            "conversion failed: malformed geometry at line 3: bad"
        );
    }
}
