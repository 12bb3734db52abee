//! Configuration management CLI commands.

use clap::Subcommand;
use meshbake::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration (file values over defaults)
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file with defaults
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init { force } => run_init(force),
    }
}

fn run_path() -> Result<(), CliError> {
    let path = config_file_path();
    println!("{}", path.display());
    if !path.exists() {
        println!("(file does not exist, defaults are in use)");
    }
    Ok(())
}

fn run_show() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let token_state = |token: &Option<String>| if token.is_some() { "(set)" } else { "(not set)" };

    println!("Configuration Settings");
    println!("======================");
    println!();
    println!("[remote]");
    println!("  url              = {}", config.remote.url);
    println!("  archive_name     = {}", config.remote.archive_name);
    println!("  request_timeout  = {}s", config.remote.request_timeout);
    println!("  connect_timeout  = {}s", config.remote.connect_timeout);
    println!(
        "  max_archive_size = {}",
        meshbake::config::format_size(config.remote.max_archive_size)
    );
    println!("  token            = {}", token_state(&config.remote.token));
    println!("  service_token    = {}", token_state(&config.remote.service_token));
    println!();
    println!("[watcher]");
    println!("  poll_interval    = {}s", config.watcher.poll_interval);
    println!("  status_timeout   = {}s", config.watcher.status_timeout);
    println!("  max_retries      = {}", config.watcher.max_retries);
    println!();
    println!("[texture]");
    println!("  max_size         = {}", config.texture.max_size);
    println!("  quality          = {}", config.texture.quality);
    println!("  compression_level = {}", config.texture.compression_level);
    println!("  workers          = {}", config.texture.workers);
    println!();
    println!("[archive]");
    println!("  mesh_extension   = {}", config.archive.mesh_extension);
    println!("  material_suffix  = {}", config.archive.material_suffix);
    println!();
    println!("[cache]");
    println!("  directory        = {}", config.cache.directory.display());
    println!();
    println!("[pipeline]");
    println!("  up_axis          = {}", config.pipeline.up_axis);
    println!("  double_sided     = {}", config.pipeline.double_sided);
    println!("  retain_artifacts = {}", config.pipeline.retain_artifacts);
    println!(
        "  work_dir         = {}",
        config
            .pipeline
            .work_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(system temp)".to_string())
    );
    println!("  fetch_timeout    = {}s", config.pipeline.fetch_timeout);
    println!();
    println!("[logging]");
    println!("  file             = {}", config.logging.file.display());
    println!("  debug            = {}", config.logging.debug);
    Ok(())
}

fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();
    if force {
        ConfigFile::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists_at(&path)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}
