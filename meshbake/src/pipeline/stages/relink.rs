//! Relink stage - points the mesh at its bare material file name.

use crate::archive::{relink, RelinkedMesh, SourceArchive};
use crate::job::JobKey;
use crate::pipeline::StageError;
use tracing::{debug, instrument};

#[instrument(skip_all, fields(job = %key))]
pub fn relink_stage(key: &JobKey, archive: &SourceArchive) -> Result<RelinkedMesh, StageError> {
    let relinked = relink(archive)?;

    debug!(
        job = %key,
        material = relinked.material_name.as_deref(),
        rewritten_lines = relinked.rewritten_lines,
        "Relink stage complete"
    );

    Ok(relinked)
}
