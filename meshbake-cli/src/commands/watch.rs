//! Watch a remote job, convert it on completion and store it in the cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use meshbake::job::{Credential, JobOptions};
use meshbake::remote::HttpJobClient;
use meshbake::service::{ConversionService, ServiceError};
use meshbake::watcher::{JobWatcher, WatchEvent};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::common::JobArgs;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `meshbake watch`.
#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub job: JobArgs,

    /// Processing node URL (overrides [remote] url)
    #[arg(long)]
    pub url: Option<String>,

    /// Bearer token (overrides [remote] token)
    #[arg(long)]
    pub token: Option<String>,

    /// Service token sent as a query parameter (overrides [remote] service_token)
    #[arg(long)]
    pub service_token: Option<String>,

    /// Job options, as a JSON list/object or comma-separated key=value pairs
    #[arg(long)]
    pub options: Option<String>,

    /// Also copy the asset to this path
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Run the watch command.
pub fn run(args: WatchArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug)?;
    runner.log_startup("watch");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Config(format!("Failed to start async runtime: {}", e)))?;

    runtime.block_on(watch(&runner, args))
}

async fn watch(runner: &CliRunner, args: WatchArgs) -> Result<(), CliError> {
    let config = runner.config();
    let key = args.job.key()?;

    let mut remote = config.remote_config();
    if let Some(url) = args.url {
        remote.base_url = url;
    }
    let defaults = config.credential();
    let credential = Credential::new(
        args.token.or(defaults.bearer_token),
        args.service_token.or(defaults.service_token),
    );
    let options = args
        .options
        .as_deref()
        .map(JobOptions::parse)
        .unwrap_or_default();

    let node_url = remote.base().to_string();
    let client = Arc::new(HttpJobClient::new(remote).map_err(CliError::Remote)?);
    let cache = Arc::new(runner.open_cache()?);
    let service = Arc::new(
        ConversionService::new(Arc::clone(&client), cache, config.pipeline_config())
            .with_fetch_timeout(config.fetch_timeout()),
    );
    let watcher = JobWatcher::from_arc(client, config.watcher_config());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || on_interrupt.cancel())
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    if let Some(cached) = service.cached(&key).await? {
        println!("Job {} is already converted", key);
        return finish(runner, &cached.bytes, cached.path, args.output.as_deref());
    }

    println!(
        "Watching job {} on {} (every {}s, Ctrl+C to stop)",
        key, node_url, config.watcher.poll_interval
    );
    let mut handle = service.watch_job(&watcher, key.clone(), credential, options, &cancel);

    while let Some(event) = handle.next_event().await {
        match event {
            WatchEvent::StatusChanged { status, progress } => {
                println!("  {} ({}%)", status, progress);
            }
            WatchEvent::TransientError { attempt, error } => {
                warn!(attempt, error = %error, "Status poll failed, retrying");
                println!("  poll failed (attempt {}): {}", attempt, error);
            }
            WatchEvent::Terminal(status) => {
                info!(job = %key, status = %status, "Job reached terminal status");
                if status.is_success() {
                    println!("Job completed, converting...");
                }
            }
        }
    }

    let artifact = handle
        .wait()
        .await
        .map_err(|source| ServiceError::Watch {
            job: key.clone(),
            source,
        })??;
    finish(runner, &artifact.bytes, artifact.path, args.output.as_deref())
}

fn finish(
    runner: &CliRunner,
    bytes: &[u8],
    cached_at: Option<PathBuf>,
    output: Option<&Path>,
) -> Result<(), CliError> {
    if let Some(path) = cached_at {
        println!("{}", path.display());
    }
    if let Some(output) = output {
        runner.save_asset(output, bytes)?;
    }
    Ok(())
}
