//! ZIP archive ingestion.

use super::{base_name, ArchiveError};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use tracing::{debug, warn};

/// Raster extensions recognized as textures.
pub const TEXTURE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Rules selecting the mesh and material entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRules {
    /// Mesh entry suffix, matched case-insensitively (default `.obj`).
    pub mesh_extension: String,
    /// Material entry suffix, matched case-insensitively (default `.mtl`).
    pub material_suffix: String,
}

impl Default for IngestRules {
    fn default() -> Self {
        Self {
            mesh_extension: ".obj".to_string(),
            material_suffix: ".mtl".to_string(),
        }
    }
}

/// One extracted archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Full entry name inside the archive.
    pub path: String,
    pub data: Bytes,
}

impl ArchiveEntry {
    /// The entry's file name without any directory prefix.
    pub fn file_name(&self) -> &str {
        base_name(&self.path)
    }
}

/// A validated job archive.
#[derive(Debug, Clone)]
pub struct SourceArchive {
    pub mesh: ArchiveEntry,
    pub material: Option<ArchiveEntry>,
    /// Texture payloads keyed by base file name.
    pub textures: BTreeMap<String, Bytes>,
}

impl SourceArchive {
    /// Total payload size across mesh, material and textures.
    pub fn total_bytes(&self) -> usize {
        self.mesh.data.len()
            + self.material.as_ref().map_or(0, |m| m.data.len())
            + self.textures.values().map(Bytes::len).sum::<usize>()
    }
}

/// Parses archive bytes into a [`SourceArchive`].
///
/// The first entry ending in the mesh extension becomes the mesh, the first
/// ending in the material suffix becomes the material. Entries with a
/// recognized raster extension become textures keyed by base name; on a
/// name collision the first entry wins. Directory entries and macOS
/// resource forks are skipped.
pub fn ingest(bytes: &[u8], rules: &IngestRules) -> Result<SourceArchive, ArchiveError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;

    let mesh_ext = rules.mesh_extension.to_ascii_lowercase();
    let material_ext = rules.material_suffix.to_ascii_lowercase();

    let mut mesh = None;
    let mut material = None;
    let mut textures = BTreeMap::new();

    for index in 0..zip.len() {
        let mut file = zip.by_index(index)?;
        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        if name.starts_with("__MACOSX/") {
            continue;
        }
        let lower = name.to_ascii_lowercase();

        let is_mesh = mesh.is_none() && lower.ends_with(&mesh_ext);
        let is_material = !is_mesh && material.is_none() && lower.ends_with(&material_ext);
        let is_texture = !is_mesh && !is_material && is_texture_name(&lower);

        if !(is_mesh || is_material || is_texture) {
            debug!(entry = %name, "Skipping archive entry");
            continue;
        }

        let texture_key = base_name(&name).to_string();
        if is_texture && textures.contains_key(&texture_key) {
            warn!(entry = %name, texture = %texture_key, "Duplicate texture name, keeping first");
            continue;
        }

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .map_err(|source| ArchiveError::EntryRead {
                name: name.clone(),
                source,
            })?;
        let data = Bytes::from(data);

        if is_mesh {
            mesh = Some(ArchiveEntry { path: name, data });
        } else if is_material {
            material = Some(ArchiveEntry { path: name, data });
        } else {
            textures.insert(texture_key, data);
        }
    }

    let mesh = mesh.ok_or_else(|| ArchiveError::MissingMesh {
        extension: rules.mesh_extension.clone(),
    })?;

    debug!(
        mesh = %mesh.path,
        material = material.as_ref().map(|m: &ArchiveEntry| m.path.as_str()),
        textures = textures.len(),
        "Archive ingested"
    );

    Ok(SourceArchive {
        mesh,
        material,
        textures,
    })
}

fn is_texture_name(lower: &str) -> bool {
    lower
        .rsplit_once('.')
        .is_some_and(|(_, ext)| TEXTURE_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_full_archive() {
        let zip = build_zip(&[
            ("odm_texturing/", b""),
            ("odm_texturing/model.obj", b"v 0 0 0\n"),
            ("odm_texturing/model.mtl", b"newmtl m\n"),
            ("odm_texturing/tex1.png", b"png"),
            ("odm_texturing/tex2.JPG", b"jpg"),
            ("report.pdf", b"pdf"),
        ]);

        let archive = ingest(&zip, &IngestRules::default()).unwrap();
        assert_eq!(archive.mesh.path, "odm_texturing/model.obj");
        assert_eq!(archive.mesh.file_name(), "model.obj");
        assert_eq!(archive.mesh.data.as_ref(), b"v 0 0 0\n");
        assert_eq!(archive.material.as_ref().unwrap().file_name(), "model.mtl");
        assert_eq!(
            archive.textures.keys().collect::<Vec<_>>(),
            vec!["tex1.png", "tex2.JPG"]
        );
        assert_eq!(archive.total_bytes(), 8 + 9 + 3 + 3);
    }

    #[test]
    fn test_mesh_match_is_case_insensitive() {
        let zip = build_zip(&[("MODEL.OBJ", b"v 1 2 3\n")]);
        let archive = ingest(&zip, &IngestRules::default()).unwrap();
        assert_eq!(archive.mesh.path, "MODEL.OBJ");
        assert!(archive.material.is_none());
        assert!(archive.textures.is_empty());
    }

    #[test]
    fn test_first_mesh_wins() {
        let zip = build_zip(&[("a.obj", b"first"), ("b.obj", b"second")]);
        let archive = ingest(&zip, &IngestRules::default()).unwrap();
        assert_eq!(archive.mesh.data.as_ref(), b"first");
    }

    #[test]
    fn test_missing_mesh() {
        let zip = build_zip(&[("model.mtl", b"newmtl m\n"), ("tex.png", b"x")]);
        let err = ingest(&zip, &IngestRules::default()).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingMesh { .. }));
    }

    #[test]
    fn test_corrupt_archive() {
        let err = ingest(b"definitely not a zip", &IngestRules::default()).unwrap_err();
        assert!(matches!(err, ArchiveError::Corrupt(_)));
    }

    #[test]
    fn test_duplicate_texture_keeps_first() {
        let zip = build_zip(&[
            ("model.obj", b""),
            ("a/tex.png", b"first"),
            ("b/tex.png", b"second"),
        ]);
        let archive = ingest(&zip, &IngestRules::default()).unwrap();
        assert_eq!(archive.textures.len(), 1);
        assert_eq!(archive.textures["tex.png"].as_ref(), b"first");
    }

    #[test]
    fn test_custom_material_suffix() {
        let rules = IngestRules {
            material_suffix: "_geo.mtl".to_string(),
            ..IngestRules::default()
        };
        let zip = build_zip(&[
            ("model.obj", b""),
            ("model.mtl", b"plain"),
            ("model_geo.mtl", b"geo"),
        ]);
        let archive = ingest(&zip, &rules).unwrap();
        assert_eq!(archive.material.unwrap().data.as_ref(), b"geo");
    }

    #[test]
    fn test_skips_resource_forks() {
        let zip = build_zip(&[("__MACOSX/._model.obj", b"junk"), ("model.obj", b"real")]);
        let archive = ingest(&zip, &IngestRules::default()).unwrap();
        assert_eq!(archive.mesh.data.as_ref(), b"real");
    }
}
