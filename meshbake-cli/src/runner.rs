//! CLI runner for common setup and operations.
//!
//! Loads the config file, initializes logging and owns the helpers shared
//! by the `convert` and `watch` commands.

use crate::error::CliError;
use meshbake::cache::ResultCache;
use meshbake::config::ConfigFile;
use meshbake::logging::{init_logging, split_log_path, LoggingGuard};
use std::path::Path;
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Loads config and starts logging.
    ///
    /// Log output also goes to stdout when `debug` is set, either on the
    /// command line or in `[logging]`.
    pub fn new(debug: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let debug = debug || config.logging.debug;

        let (log_dir, log_file) = split_log_path(&config.logging.file);
        let logging_guard = init_logging(&log_dir, &log_file, debug, debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("meshbake v{}", meshbake::VERSION);
        info!("meshbake CLI: {} command", command);
    }

    /// Opens the result cache configured in `[cache]`.
    pub fn open_cache(&self) -> Result<ResultCache, CliError> {
        Ok(ResultCache::new(self.config.cache.directory.clone())?)
    }

    /// Writes an asset to disk and reports its size.
    pub fn save_asset(&self, path: &Path, data: &[u8]) -> Result<(), CliError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|error| CliError::FileWrite {
                path: parent.to_path_buf(),
                error,
            })?;
        }
        std::fs::write(path, data).map_err(|error| CliError::FileWrite {
            path: path.to_path_buf(),
            error,
        })?;

        let size_mb = data.len() as f64 / 1_048_576.0;
        info!(path = %path.display(), bytes = data.len(), "Asset saved");
        println!("✓ Saved: {} ({:.2} MB)", path.display(), size_mb);
        Ok(())
    }
}
