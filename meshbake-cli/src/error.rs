//! CLI error handling with user-friendly messages and exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;
use meshbake::cache::CacheError;
use meshbake::config::ConfigFileError;
use meshbake::job::JobKey;
use meshbake::pipeline::PipelineError;
use meshbake::remote::RemoteError;
use meshbake::service::ServiceError;
use meshbake::watcher::WatchError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Bad command-line argument
    InvalidArgument(String),
    /// Failed to read an input file
    FileRead { path: PathBuf, error: std::io::Error },
    /// Failed to write an output file
    FileWrite { path: PathBuf, error: std::io::Error },
    /// Local conversion failed
    Conversion(PipelineError),
    /// Watching or converting a remote job failed
    Service(ServiceError),
    /// Failed to create the HTTP client
    Remote(RemoteError),
    /// Result cache unavailable
    Cache(CacheError),
    /// No cached asset for the job
    NotCached(JobKey),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::InvalidArgument(_) => 2,
            CliError::Conversion(_) => 3,
            CliError::Service(ServiceError::Pipeline(_)) => 3,
            CliError::Service(ServiceError::Watch { source, .. }) => match source {
                WatchError::Cancelled => 130,
                e if e.is_job_terminal() => 4,
                _ => 5,
            },
            CliError::Service(_) | CliError::Remote(_) => 5,
            CliError::NotCached(_) => 6,
            _ => 1,
        }
    }

    /// Prints the error, plus a hint for common cases, and exits.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Conversion(e) if e.is_missing_mesh() => {
                eprintln!();
                eprintln!("The archive holds no mesh. Check that the job produced a textured");
                eprintln!("model, or set [archive] mesh_extension in config.ini.");
            }
            CliError::Service(ServiceError::Watch {
                source: WatchError::TransientPoll { .. },
                ..
            })
            | CliError::Service(ServiceError::Fetch { .. }) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Processing node unreachable: check [remote] url or --url");
                eprintln!("  2. Authentication: pass --token / --service-token");
            }
            CliError::NotCached(key) => {
                eprintln!();
                eprintln!(
                    "Run 'meshbake watch --project {} --job {}' to convert it first.",
                    key.project_id(),
                    key.job_id()
                );
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read '{}': {}", path.display(), error)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write '{}': {}", path.display(), error)
            }
            CliError::Conversion(e) => write!(f, "Conversion failed: {}", e),
            CliError::Service(e) => write!(f, "{}", e),
            CliError::Remote(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Cache(e) => write!(f, "Result cache error: {}", e),
            CliError::NotCached(key) => write!(f, "No cached asset for job {}", key),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::FileRead { error, .. } | CliError::FileWrite { error, .. } => Some(error),
            CliError::Conversion(e) => Some(e),
            CliError::Service(e) => Some(e),
            CliError::Remote(e) => Some(e),
            CliError::Cache(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Conversion(e)
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e)
    }
}
