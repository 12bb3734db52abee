//! Job archive handling.
//!
//! A finished photogrammetry job is packaged as a ZIP archive holding a
//! textured OBJ mesh, its MTL material file and the raster textures the
//! material references. This module turns the raw archive bytes into a
//! typed [`SourceArchive`] and rewrites the mesh's material reference so
//! that it resolves against the flat set of extracted entries.
//!
//! Both steps are pure: no filesystem or network access.

mod error;
mod ingest;
mod relink;

pub use error::{ArchiveError, RelinkError};
pub use ingest::{ingest, ArchiveEntry, IngestRules, SourceArchive, TEXTURE_EXTENSIONS};
pub use relink::{relink, rewrite_mtllib, RelinkedMesh};

/// Returns the final path component of an archive entry name.
///
/// Archive entries always use `/`, but meshes exported on Windows
/// occasionally reference materials with `\` separators, so both are
/// treated as separators.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("model.obj"), "model.obj");
        assert_eq!(base_name("odm_texturing/model.obj"), "model.obj");
        assert_eq!(base_name("C:\\work\\out\\model.mtl"), "model.mtl");
        assert_eq!(base_name("a/b/"), "");
    }
}
