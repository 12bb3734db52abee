//! Ingest stage - parses the job archive.

use crate::archive::{ingest, IngestRules, SourceArchive};
use crate::job::JobKey;
use crate::pipeline::StageError;
use tracing::{debug, instrument};

/// Reads the mesh, material and textures out of a ZIP archive.
#[instrument(skip_all, fields(job = %key, archive_bytes = bytes.len()))]
pub fn ingest_stage(
    key: &JobKey,
    bytes: &[u8],
    rules: &IngestRules,
) -> Result<SourceArchive, StageError> {
    let archive = ingest(bytes, rules)?;

    debug!(
        job = %key,
        mesh = %archive.mesh.path,
        has_material = archive.material.is_some(),
        textures = archive.textures.len(),
        payload_bytes = archive.total_bytes(),
        "Ingest stage complete"
    );

    Ok(archive)
}
