//! Wavefront OBJ geometry parsing.
//!
//! Supports `v`, `vt`, `vn`, `f` and `usemtl`. Polygons are fan
//! triangulated. Grouping, smoothing, line and point statements are
//! accepted and ignored.

use super::AssembleError;
use std::collections::HashMap;

/// One face corner: zero-based attribute indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Corner {
    pub position: usize,
    pub texcoord: Option<usize>,
    pub normal: Option<usize>,
}

/// Triangles sharing one material.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceGroup {
    pub material: Option<String>,
    pub triangles: Vec<[Corner; 3]>,
}

/// Parsed OBJ geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjModel {
    pub positions: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    /// Face groups in order of first `usemtl` appearance.
    pub groups: Vec<FaceGroup>,
}

impl ObjModel {
    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.triangles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }
}

/// Face corner before range validation, with its source line.
struct PendingFace {
    line: usize,
    group: usize,
    corners: Vec<RawCorner>,
}

#[derive(Clone, Copy)]
struct RawCorner {
    position: i64,
    texcoord: Option<i64>,
    normal: Option<i64>,
}

/// Parses OBJ text.
///
/// Negative (relative) indices are resolved against the attributes defined
/// so far; all indices are range checked once the whole file is read.
pub fn parse_obj(text: &str) -> Result<ObjModel, AssembleError> {
    let mut model = ObjModel::default();
    let mut pending: Vec<PendingFace> = Vec::new();
    let mut group_index: HashMap<Option<String>, usize> = HashMap::new();
    let mut current_group: Option<usize> = None;
    let mut current_material: Option<String> = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.split('#').next().unwrap_or("").trim();
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&mut tokens, line_no, "v", 3)?;
                model.positions.push([x, y, z]);
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(&mut tokens, line_no, "vt", 1)?;
                model.texcoords.push([u, v]);
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&mut tokens, line_no, "vn", 3)?;
                model.normals.push([x, y, z]);
            }
            "f" => {
                let corners = tokens
                    .map(|token| parse_corner(token, line_no, &model))
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    return Err(AssembleError::MalformedGeometry {
                        line: line_no,
                        reason: format!("face has {} vertices, need at least 3", corners.len()),
                    });
                }

                let group = *current_group.get_or_insert_with(|| {
                    group_for(&mut model, &mut group_index, current_material.clone())
                });
                pending.push(PendingFace {
                    line: line_no,
                    group,
                    corners,
                });
            }
            "usemtl" => {
                let name = tokens.collect::<Vec<_>>().join(" ");
                current_material = (!name.is_empty()).then_some(name);
                current_group = None;
            }
            "vp" | "o" | "g" | "s" | "l" | "p" | "mtllib" | "cstype" | "deg" | "curv"
            | "surf" | "parm" | "end" | "lod" | "maplib" | "usemap" | "shadow_obj"
            | "trace_obj" | "bevel" | "c_interp" | "d_interp" => {}
            other => {
                tracing::trace!(line = line_no, keyword = other, "Ignoring unknown OBJ statement");
            }
        }
    }

    for face in pending {
        let corners = face
            .corners
            .iter()
            .map(|raw| resolve_corner(raw, face.line, &model))
            .collect::<Result<Vec<_>, _>>()?;

        let triangles = &mut model.groups[face.group].triangles;
        for i in 1..corners.len() - 1 {
            triangles.push([corners[0], corners[i], corners[i + 1]]);
        }
    }

    model.groups.retain(|g| !g.triangles.is_empty());
    Ok(model)
}

fn group_for(
    model: &mut ObjModel,
    index: &mut HashMap<Option<String>, usize>,
    material: Option<String>,
) -> usize {
    *index.entry(material.clone()).or_insert_with(|| {
        model.groups.push(FaceGroup {
            material,
            triangles: Vec::new(),
        });
        model.groups.len() - 1
    })
}

fn parse_floats<'a, const N: usize>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line: usize,
    keyword: &str,
    required: usize,
) -> Result<[f32; N], AssembleError> {
    let mut values = [0.0f32; N];
    for (i, slot) in values.iter_mut().enumerate() {
        match tokens.next() {
            Some(token) => {
                *slot = token
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| AssembleError::MalformedGeometry {
                        line,
                        reason: format!("invalid number '{}' in '{}' statement", token, keyword),
                    })?;
            }
            None if i < required => {
                return Err(AssembleError::MalformedGeometry {
                    line,
                    reason: format!("'{}' needs {} components, found {}", keyword, required, i),
                });
            }
            None => break,
        }
    }
    Ok(values)
}

fn parse_corner(token: &str, line: usize, model: &ObjModel) -> Result<RawCorner, AssembleError> {
    let mut parts = token.split('/');
    let parse = |part: Option<&str>, kind: &str| -> Result<Option<i64>, AssembleError> {
        match part {
            None | Some("") => Ok(None),
            Some(s) => match s.parse::<i64>() {
                Ok(0) | Err(_) => Err(AssembleError::MalformedGeometry {
                    line,
                    reason: format!("invalid {} index '{}' in face vertex '{}'", kind, s, token),
                }),
                Ok(v) => Ok(Some(v)),
            },
        }
    };

    let position = parse(parts.next(), "position")?.ok_or_else(|| {
        AssembleError::MalformedGeometry {
            line,
            reason: format!("face vertex '{}' has no position index", token),
        }
    })?;
    let texcoord = parse(parts.next(), "texcoord")?;
    let normal = parse(parts.next(), "normal")?;
    if parts.next().is_some() {
        return Err(AssembleError::MalformedGeometry {
            line,
            reason: format!("face vertex '{}' has too many components", token),
        });
    }

    // Relative indices count back from the attributes defined so far.
    let absolute = |index: i64, count: usize| if index < 0 { count as i64 + index + 1 } else { index };

    Ok(RawCorner {
        position: absolute(position, model.positions.len()),
        texcoord: texcoord.map(|i| absolute(i, model.texcoords.len())),
        normal: normal.map(|i| absolute(i, model.normals.len())),
    })
}

fn resolve_corner(raw: &RawCorner, line: usize, model: &ObjModel) -> Result<Corner, AssembleError> {
    let check = |index: i64, count: usize, kind: &'static str| -> Result<usize, AssembleError> {
        if index >= 1 && (index as usize) <= count {
            Ok(index as usize - 1)
        } else {
            Err(AssembleError::IndexOutOfRange {
                line,
                kind,
                index,
                count,
            })
        }
    };

    Ok(Corner {
        position: check(raw.position, model.positions.len(), "position")?,
        texcoord: raw
            .texcoord
            .map(|i| check(i, model.texcoords.len(), "texcoord"))
            .transpose()?,
        normal: raw
            .normal
            .map(|i| check(i, model.normals.len(), "normal"))
            .transpose()?,
    })
}
