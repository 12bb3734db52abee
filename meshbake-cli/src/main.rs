//! meshbake CLI - Command-line interface
//!
//! Converts photogrammetry job archives into GLB assets, either from a
//! local file or by watching a job on a processing node.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use commands::convert::ConvertArgs;
use commands::watch::WatchArgs;

#[derive(Parser)]
#[command(name = "meshbake")]
#[command(version, about = "Convert photogrammetry job archives into GLB assets", long_about = None)]
struct Cli {
    /// Enable debug logging (also mirrored to stdout)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a local job archive into a GLB file
    Convert(ConvertArgs),

    /// Watch a remote job and convert it when it completes
    Watch(WatchArgs),

    /// Inspect the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert(args) => commands::convert::run(args, cli.debug),
        Commands::Watch(args) => commands::watch::run(args, cli.debug),
        Commands::Cache { action } => commands::cache::run(action),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from([
            "meshbake",
            "convert",
            "--archive",
            "all.zip",
            "--max-size",
            "2048",
            "--keep-workdir",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert(args) => {
                assert_eq!(args.max_size, Some(2048));
                assert!(args.keep_workdir);
                assert!(args.output.is_none());
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_parse_watch_requires_job() {
        assert!(Cli::try_parse_from(["meshbake", "watch", "--project", "1"]).is_err());
        assert!(
            Cli::try_parse_from(["meshbake", "watch", "--project", "1", "--job", "abc"]).is_ok()
        );
    }

    #[test]
    fn test_quality_range() {
        assert!(Cli::try_parse_from([
            "meshbake", "convert", "--archive", "a.zip", "--quality", "0"
        ])
        .is_err());
    }
}
