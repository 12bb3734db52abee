//! Result cache CLI commands.

use std::path::PathBuf;

use clap::Subcommand;
use meshbake::cache::ResultCache;
use meshbake::config::{format_size, ConfigFile};

use super::common::JobArgs;
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show or export the cached asset for a job
    Get {
        #[command(flatten)]
        job: JobArgs,

        /// Copy the asset to this path instead of printing its location
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the cache directory
    Path,
}

/// Run a cache subcommand.
pub fn run(action: CacheAction) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let cache_dir = config.cache.directory;

    match action {
        CacheAction::Path => {
            println!("{}", cache_dir.display());
            Ok(())
        }
        CacheAction::Get { job, output } => {
            let key = job.key()?;
            let cache = ResultCache::new(cache_dir)?;
            let bytes = cache.get(&key)?.ok_or_else(|| CliError::NotCached(key.clone()))?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes).map_err(|error| CliError::FileWrite {
                        path: path.clone(),
                        error,
                    })?;
                    println!(
                        "Exported {} to {} ({})",
                        key,
                        path.display(),
                        format_size(bytes.len() as u64)
                    );
                }
                None => {
                    println!("{}", cache.path_for(&key).display());
                    println!("  Size: {} bytes", bytes.len());
                }
            }
            Ok(())
        }
    }
}
