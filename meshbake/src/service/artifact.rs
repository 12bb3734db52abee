use crate::glb::{CONTENT_TYPE, FALLBACK_CONTENT_TYPE, GLB_MAGIC};
use crate::job::JobKey;
use bytes::Bytes;
use std::path::PathBuf;

/// A job's finished asset, ready to hand to a viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetArtifact {
    pub key: JobKey,
    pub bytes: Bytes,
    /// Cache file backing the artifact.
    pub path: Option<PathBuf>,
    /// Served from the result cache without running the pipeline.
    pub cache_hit: bool,
}

impl AssetArtifact {
    /// `model/gltf-binary` for GLB data, `application/octet-stream`
    /// otherwise.
    pub fn content_type(&self) -> &'static str {
        if self.bytes.starts_with(GLB_MAGIC) {
            CONTENT_TYPE
        } else {
            FALLBACK_CONTENT_TYPE
        }
    }

    /// Declared length for the response.
    pub fn content_length(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(bytes: &'static [u8]) -> AssetArtifact {
        AssetArtifact {
            key: JobKey::new("p", "j").unwrap(),
            bytes: Bytes::from_static(bytes),
            path: None,
            cache_hit: false,
        }
    }

    #[test]
    fn test_content_type() {
        assert_eq!(artifact(b"glTF\x02\0\0\0").content_type(), "model/gltf-binary");
        assert_eq!(artifact(b"PK\x03\x04").content_type(), "application/octet-stream");
        assert_eq!(artifact(b"glTF\x02\0\0\0").content_length(), 8);
    }
}
