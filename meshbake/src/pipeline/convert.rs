//! Stage runner.

use super::stages::{assemble_stage, ingest_stage, relink_stage, transcode_stage};
use super::{PipelineConfig, PipelineError, Stage, StageError, WorkDir};
use crate::glb::{AssembledAsset, AssetAssembler};
use crate::job::JobKey;
use crate::texture::TranscodeStats;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// A successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub asset: AssembledAsset,
    pub textures: TranscodeStats,
    /// The retained work directory, when artifacts were kept.
    pub work_dir: Option<PathBuf>,
    pub duration: Duration,
}

/// Converts a job archive into a GLB asset.
///
/// Runs ingest, relink, transcode and assemble in order on the calling
/// thread. Nothing is written outside the work directory; storing the
/// result is the caller's business.
#[instrument(skip(archive, config), fields(job = %key, archive_bytes = archive.len()))]
pub fn convert_archive(
    key: &JobKey,
    archive: &[u8],
    config: &PipelineConfig,
) -> Result<ConversionOutput, PipelineError> {
    let start = Instant::now();
    let fail = |stage: Stage| move |e: StageError| PipelineError::new(key, stage, e);

    let work = WorkDir::create(config.work_root.as_deref(), key, config.retain_artifacts)
        .map_err(|e| PipelineError::new(key, Stage::Prepare, e))?;

    let source = ingest_stage(key, archive, &config.ingest).map_err(fail(Stage::Ingest))?;

    let relinked = relink_stage(key, &source).map_err(fail(Stage::Relink))?;
    work.write_artifact(source.mesh.file_name(), relinked.text.as_bytes());
    let material = source.material.as_ref().map(|entry| {
        work.write_artifact(entry.file_name(), &entry.data);
        String::from_utf8_lossy(&entry.data)
    });

    let report = transcode_stage(key, &source.textures, &config.transcode);
    for texture in report.iter() {
        work.write_artifact(&format!("textures/{}", texture.name), &texture.output);
    }

    let assembler = AssetAssembler::new()
        .with_up_axis(config.source_up_axis)
        .with_double_sided(config.double_sided);
    let asset = assemble_stage(
        key,
        &assembler,
        &relinked.text,
        material.as_deref(),
        &report,
    )
    .map_err(fail(Stage::Assemble))?;
    work.write_artifact("model.glb", asset.bytes());

    let textures = report.stats();
    let duration = start.elapsed();
    let work_dir = work.finish();

    info!(
        job = %key,
        glb_bytes = asset.len(),
        triangles = asset.summary().triangles,
        textures = textures.count,
        texture_reduction_pct = textures.reduction_percent(),
        duration_ms = duration.as_millis() as u64,
        work_dir = work_dir.as_ref().map(|p| p.display().to_string()),
        "Conversion complete"
    );

    Ok(ConversionOutput {
        asset,
        textures,
        work_dir,
        duration,
    })
}
