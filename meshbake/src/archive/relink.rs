//! Rewrites the mesh's material library reference.
//!
//! Exporters write `mtllib` with whatever path the material had on the
//! machine that produced it (`mtllib /var/www/data/abc/odm_texturing/model.mtl`).
//! After ingestion every entry is addressed by its base name, so the
//! reference is cut down to match.

use super::{RelinkError, SourceArchive};

/// Mesh text after material relinking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelinkedMesh {
    pub text: String,
    /// Base name every `mtllib` line now points at, if a material exists.
    pub material_name: Option<String>,
    /// Number of `mtllib` lines that were rewritten.
    pub rewritten_lines: usize,
}

/// Decodes the archive's mesh and points its `mtllib` lines at the
/// material entry's base name.
///
/// When the archive has no material the text is returned unmodified.
pub fn relink(archive: &SourceArchive) -> Result<RelinkedMesh, RelinkError> {
    let text = std::str::from_utf8(&archive.mesh.data).map_err(|e| RelinkError::Encoding {
        path: archive.mesh.path.clone(),
        offset: e.valid_up_to(),
    })?;

    let Some(material) = &archive.material else {
        return Ok(RelinkedMesh {
            text: text.to_string(),
            material_name: None,
            rewritten_lines: 0,
        });
    };

    let material_name = material.file_name().to_string();
    let (text, rewritten_lines) = rewrite_mtllib(text, &material_name);

    tracing::debug!(
        mesh = %archive.mesh.path,
        material = %material_name,
        rewritten_lines,
        "Relinked material library"
    );

    Ok(RelinkedMesh {
        text,
        material_name: Some(material_name),
        rewritten_lines,
    })
}

/// Replaces the target of every `mtllib` line with `material_name`.
///
/// Leading indentation and line endings are kept; every other line is
/// copied through untouched. Returns the new text and the number of lines
/// rewritten.
pub fn rewrite_mtllib(text: &str, material_name: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut rewritten = 0;

    for line in text.split_inclusive('\n') {
        let (body, ending) = split_line_ending(line);
        let trimmed = body.trim_start();

        if is_mtllib(trimmed) {
            let indent = &body[..body.len() - trimmed.len()];
            out.push_str(indent);
            out.push_str("mtllib ");
            out.push_str(material_name);
            out.push_str(ending);
            rewritten += 1;
        } else {
            out.push_str(line);
        }
    }

    (out, rewritten)
}

fn is_mtllib(line: &str) -> bool {
    line.strip_prefix("mtllib")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveEntry;
    use bytes::Bytes;
    use std::collections::BTreeMap;

    fn archive(mesh: &[u8], material: Option<&str>) -> SourceArchive {
        SourceArchive {
            mesh: ArchiveEntry {
                path: "odm_texturing/model.obj".to_string(),
                data: Bytes::copy_from_slice(mesh),
            },
            material: material.map(|path| ArchiveEntry {
                path: path.to_string(),
                data: Bytes::from_static(b"newmtl m\n"),
            }),
            textures: BTreeMap::new(),
        }
    }

    #[test]
    fn test_rewrites_any_depth() {
        for reference in [
            "model.mtl",
            "./model.mtl",
            "odm_texturing/model.mtl",
            "/var/www/data/3f2a/odm_texturing/model.mtl",
            "C:\\jobs\\out\\model.mtl",
        ] {
            let text = format!("# header\nmtllib {reference}\nv 0 0 0\n");
            let (out, count) = rewrite_mtllib(&text, "model.mtl");
            assert_eq!(out, "# header\nmtllib model.mtl\nv 0 0 0\n", "{reference}");
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn test_preserves_line_endings_and_indent() {
        let text = "v 1 2 3\r\n  mtllib a/b/c.mtl\r\nusemtl m\r\nf 1 1 1";
        let (out, count) = rewrite_mtllib(text, "c.mtl");
        assert_eq!(out, "v 1 2 3\r\n  mtllib c.mtl\r\nusemtl m\r\nf 1 1 1");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_multiple_and_trailing_lines() {
        let text = "mtllib x/one.mtl\nv 0 0 0\nmtllib y/two.mtl";
        let (out, count) = rewrite_mtllib(text, "model.mtl");
        assert_eq!(out, "mtllib model.mtl\nv 0 0 0\nmtllib model.mtl");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_ignores_lookalike_keywords() {
        let text = "mtllibrary foo\n# mtllib commented.mtl\n";
        let (out, count) = rewrite_mtllib(text, "model.mtl");
        assert_eq!(out, text);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_relink_uses_material_base_name() {
        let archive = archive(b"mtllib /abs/path/model.mtl\nv 0 0 0\n", Some("odm_texturing/model.mtl"));
        let relinked = relink(&archive).unwrap();
        assert_eq!(relinked.text, "mtllib model.mtl\nv 0 0 0\n");
        assert_eq!(relinked.material_name.as_deref(), Some("model.mtl"));
        assert_eq!(relinked.rewritten_lines, 1);
    }

    #[test]
    fn test_relink_without_material_is_identity() {
        let mesh = b"mtllib /abs/path/model.mtl\nv 0 0 0\n";
        let relinked = relink(&archive(mesh, None)).unwrap();
        assert_eq!(relinked.text.as_bytes(), mesh);
        assert_eq!(relinked.material_name, None);
        assert_eq!(relinked.rewritten_lines, 0);
    }

    #[test]
    fn test_relink_rejects_invalid_utf8() {
        let err = relink(&archive(b"v 0 0 0\n\xff\xfe", Some("model.mtl"))).unwrap_err();
        match err {
            RelinkError::Encoding { offset, .. } => assert_eq!(offset, 8),
        }
    }
}
