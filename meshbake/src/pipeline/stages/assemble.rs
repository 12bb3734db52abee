//! Assemble stage - builds the GLB container.

use crate::glb::{AssembledAsset, AssetAssembler};
use crate::job::JobKey;
use crate::pipeline::StageError;
use crate::texture::TranscodeReport;
use tracing::{debug, instrument};

/// Builds the GLB from relinked mesh text, optional material text and the
/// transcoded textures.
#[instrument(skip_all, fields(job = %key))]
pub fn assemble_stage(
    key: &JobKey,
    assembler: &AssetAssembler,
    mesh: &str,
    material: Option<&str>,
    textures: &TranscodeReport,
) -> Result<AssembledAsset, StageError> {
    let asset = assembler.assemble(mesh, material, textures)?;

    let summary = asset.summary();
    debug!(
        job = %key,
        vertices = summary.vertices,
        triangles = summary.triangles,
        materials = summary.materials,
        textures = summary.textures,
        size_bytes = summary.byte_length,
        "Assemble stage complete"
    );

    Ok(asset)
}
