//! Transcode stage - shrinks and recompresses textures.

use crate::job::JobKey;
use crate::texture::{TextureTranscoder, TranscodeConfig, TranscodeReport};
use bytes::Bytes;
use std::collections::BTreeMap;
use tracing::instrument;

/// Transcodes every texture in the archive.
///
/// This stage never fails: a texture that cannot be transcoded is carried
/// through with its original bytes and recorded as failed in the report.
#[instrument(skip_all, fields(job = %key, textures = textures.len()))]
pub fn transcode_stage(
    key: &JobKey,
    textures: &BTreeMap<String, Bytes>,
    config: &TranscodeConfig,
) -> TranscodeReport {
    TextureTranscoder::new(config.clone()).transcode_all(textures)
}
