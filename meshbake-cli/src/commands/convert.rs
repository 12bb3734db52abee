//! Offline conversion of a local job archive.

use std::path::{Path, PathBuf};

use clap::Args;
use meshbake::glb::UpAxis;
use meshbake::job::{JobKey, JobOptions};
use meshbake::pipeline::{convert_archive, PipelineConfig};
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `meshbake convert`.
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Job archive (ZIP with OBJ, MTL and textures)
    #[arg(long)]
    pub archive: PathBuf,

    /// Output GLB path (default: archive path with a .glb extension)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Largest texture width or height in pixels
    #[arg(long)]
    pub max_size: Option<u32>,

    /// JPEG texture quality (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Job options, as a JSON list/object or comma-separated key=value pairs
    #[arg(long)]
    pub options: Option<String>,

    /// Up axis of the source geometry (y or z)
    #[arg(long)]
    pub up_axis: Option<UpAxis>,

    /// Keep the work directory and stage artifacts
    #[arg(long)]
    pub keep_workdir: bool,
}

/// Run the convert command.
pub fn run(args: ConvertArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug)?;
    runner.log_startup("convert");

    let archive = std::fs::read(&args.archive).map_err(|error| CliError::FileRead {
        path: args.archive.clone(),
        error,
    })?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.archive.with_extension("glb"));
    let key = local_key(&args.archive)?;

    let config = pipeline_config(runner.config().pipeline_config(), &args)?;

    println!("Converting {}...", args.archive.display());
    let result = convert_archive(&key, &archive, &config)?;
    runner.save_asset(&output, result.asset.bytes())?;

    let summary = result.asset.summary();
    println!(
        "  Geometry: {} vertices, {} triangles in {} primitive(s)",
        summary.vertices, summary.triangles, summary.primitives
    );
    println!(
        "  Materials: {}, textures: {}",
        summary.materials, summary.textures
    );
    if result.textures.count > 0 {
        println!("  Textures: {}", result.textures);
    }
    if let Some(dir) = &result.work_dir {
        println!("  Work directory kept at {}", dir.display());
    }
    info!(
        duration_ms = result.duration.as_millis() as u64,
        "Convert command finished"
    );
    println!("Done in {:.2}s", result.duration.as_secs_f64());
    Ok(())
}

/// Applies `--options` on top of the configured pipeline, then the explicit
/// flags, so a flag typed on the command line always wins.
fn pipeline_config(base: PipelineConfig, args: &ConvertArgs) -> Result<PipelineConfig, CliError> {
    let options = args
        .options
        .as_deref()
        .map(JobOptions::parse)
        .unwrap_or_default();
    let mut config = base.with_options(&options);

    if let Some(size) = args.max_size {
        if size == 0 {
            return Err(CliError::InvalidArgument("--max-size must be positive".into()));
        }
        config.transcode.max_width = size;
        config.transcode.max_height = size;
    }
    if let Some(quality) = args.quality {
        config.transcode.quality = quality;
    }
    if let Some(axis) = args.up_axis {
        config.source_up_axis = axis;
    }
    config.retain_artifacts |= args.keep_workdir;
    Ok(config)
}

/// Key for an archive converted outside any project: `local/<file stem>`.
fn local_key(archive: &Path) -> Result<JobKey, CliError> {
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    JobKey::new("local", stem).map_err(|e| {
        CliError::InvalidArgument(format!("cannot derive a job name from the archive: {e}"))
    })
}
