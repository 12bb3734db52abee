//! Argument types shared across commands.

use clap::Args;
use meshbake::job::JobKey;

use crate::error::CliError;

/// Identifies a job by project and job id.
#[derive(Debug, Clone, Args)]
pub struct JobArgs {
    /// Project the job belongs to
    #[arg(long)]
    pub project: String,

    /// Job id on the processing node
    #[arg(long)]
    pub job: String,
}

impl JobArgs {
    pub fn key(&self) -> Result<JobKey, CliError> {
        JobKey::new(self.project.as_str(), self.job.as_str())
            .map_err(|e| CliError::InvalidArgument(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_validation() {
        let args = JobArgs {
            project: "42".into(),
            job: "3f2a".into(),
        };
        assert_eq!(args.key().unwrap().to_string(), "42/3f2a");

        let bad = JobArgs {
            project: "42".into(),
            job: "../etc".into(),
        };
        assert!(matches!(bad.key(), Err(CliError::InvalidArgument(_))));
    }
}
