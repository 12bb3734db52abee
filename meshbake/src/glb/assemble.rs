//! Builds a GLB asset from OBJ/MTL text and transcoded textures.

use super::container::write_glb;
use super::document::*;
use super::mtl::{parse_mtl, MaterialLibrary, MtlMaterial};
use super::obj::{parse_obj, Corner, FaceGroup, ObjModel};
use super::AssembleError;
use crate::archive::base_name;
use crate::texture::TranscodeReport;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Content type of an assembled asset.
pub const CONTENT_TYPE: &str = "model/gltf-binary";

/// Content type used when an artifact's type is unknown.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Up axis of the source geometry. glTF is always Y-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpAxis {
    Y,
    /// Photogrammetry output is georeferenced with Z up.
    #[default]
    Z,
}

impl UpAxis {
    fn to_gltf(self, [x, y, z]: [f32; 3]) -> [f32; 3] {
        match self {
            UpAxis::Y => [x, y, z],
            UpAxis::Z => [x, z, -y],
        }
    }
}

impl FromStr for UpAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "y" => Ok(UpAxis::Y),
            "z" => Ok(UpAxis::Z),
            other => Err(format!("unknown up axis '{}', expected 'y' or 'z'", other)),
        }
    }
}

impl fmt::Display for UpAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpAxis::Y => write!(f, "y"),
            UpAxis::Z => write!(f, "z"),
        }
    }
}

/// Counts describing an assembled asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetSummary {
    pub vertices: usize,
    pub triangles: usize,
    pub primitives: usize,
    pub materials: usize,
    pub textures: usize,
    pub byte_length: usize,
}

/// A finished GLB buffer.
#[derive(Debug, Clone)]
pub struct AssembledAsset {
    bytes: Bytes,
    summary: AssetSummary,
}

impl AssembledAsset {
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn summary(&self) -> &AssetSummary {
        &self.summary
    }

    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Converts relinked OBJ geometry into a single-mesh GLB.
#[derive(Debug, Clone)]
pub struct AssetAssembler {
    up_axis: UpAxis,
    double_sided: bool,
    generator: String,
}

impl Default for AssetAssembler {
    fn default() -> Self {
        Self {
            up_axis: UpAxis::default(),
            double_sided: true,
            generator: format!("meshbake {}", crate::VERSION),
        }
    }
}

impl AssetAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_up_axis(mut self, up_axis: UpAxis) -> Self {
        self.up_axis = up_axis;
        self
    }

    pub fn with_double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }

    /// Builds the GLB.
    ///
    /// Material texture references are matched by base name, ignoring
    /// case, against `textures`. Materials named by the mesh but missing
    /// from the library are dropped; their triangles are kept untextured.
    pub fn assemble(
        &self,
        mesh: &str,
        material: Option<&str>,
        textures: &TranscodeReport,
    ) -> Result<AssembledAsset, AssembleError> {
        let model = parse_obj(mesh)?;
        let library = material.map(parse_mtl).unwrap_or_default();

        let mut builder = DocumentBuilder::new(self, &library, textures);
        for group in &model.groups {
            builder.add_primitive(&model, group);
        }

        let (document, bin, mut summary) = builder.finish();
        let json = serde_json::to_vec(&document)?;
        let bytes = write_glb(&json, &bin)?;
        summary.byte_length = bytes.len();

        debug!(
            vertices = summary.vertices,
            triangles = summary.triangles,
            primitives = summary.primitives,
            materials = summary.materials,
            textures = summary.textures,
            bytes = summary.byte_length,
            "GLB assembled"
        );

        Ok(AssembledAsset {
            bytes: Bytes::from(bytes),
            summary,
        })
    }
}

struct DocumentBuilder<'a> {
    assembler: &'a AssetAssembler,
    library: &'a MaterialLibrary,
    textures: &'a TranscodeReport,
    bin: Vec<u8>,
    buffer_views: Vec<BufferView>,
    accessors: Vec<Accessor>,
    primitives: Vec<Primitive>,
    materials: Vec<Material>,
    material_index: HashMap<String, Option<usize>>,
    gltf_textures: Vec<Texture>,
    images: Vec<Image>,
    texture_index: HashMap<String, Option<usize>>,
    summary: AssetSummary,
}

impl<'a> DocumentBuilder<'a> {
    fn new(
        assembler: &'a AssetAssembler,
        library: &'a MaterialLibrary,
        textures: &'a TranscodeReport,
    ) -> Self {
        Self {
            assembler,
            library,
            textures,
            bin: Vec::new(),
            buffer_views: Vec::new(),
            accessors: Vec::new(),
            primitives: Vec::new(),
            materials: Vec::new(),
            material_index: HashMap::new(),
            gltf_textures: Vec::new(),
            images: Vec::new(),
            texture_index: HashMap::new(),
            summary: AssetSummary::default(),
        }
    }

    fn push_view(&mut self, data: &[u8], target: Option<u32>) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        self.buffer_views.push(BufferView {
            buffer: 0,
            byte_offset: self.bin.len(),
            byte_length: data.len(),
            target,
        });
        self.bin.extend_from_slice(data);
        self.buffer_views.len() - 1
    }

    fn push_accessor(
        &mut self,
        data: &[u8],
        target: u32,
        component_type: u32,
        count: usize,
        kind: &'static str,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
    ) -> usize {
        let buffer_view = self.push_view(data, Some(target));
        let (min, max) = bounds.map_or((None, None), |(min, max)| (Some(min), Some(max)));
        self.accessors.push(Accessor {
            buffer_view,
            component_type,
            count,
            kind,
            min,
            max,
        });
        self.accessors.len() - 1
    }

    fn add_primitive(&mut self, model: &ObjModel, group: &FaceGroup) {
        let with_uv = group.triangles.iter().flatten().all(|c| c.texcoord.is_some());
        let with_normal = group.triangles.iter().flatten().all(|c| c.normal.is_some());

        let mut remap: HashMap<Corner, u32> = HashMap::new();
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut uvs: Vec<[f32; 2]> = Vec::new();
        let mut indices: Vec<u32> = Vec::with_capacity(group.triangles.len() * 3);

        for corner in group.triangles.iter().flatten() {
            // Attributes dropped for the primitive must not split vertices.
            let key = Corner {
                position: corner.position,
                texcoord: corner.texcoord.filter(|_| with_uv),
                normal: corner.normal.filter(|_| with_normal),
            };
            let index = *remap.entry(key).or_insert_with(|| {
                positions.push(self.assembler.up_axis.to_gltf(model.positions[key.position]));
                if let Some(n) = key.normal {
                    normals.push(normalize(self.assembler.up_axis.to_gltf(model.normals[n])));
                }
                if let Some(t) = key.texcoord {
                    let [u, v] = model.texcoords[t];
                    uvs.push([u, 1.0 - v]);
                }
                (positions.len() - 1) as u32
            });
            indices.push(index);
        }

        let (min, max) = bounds(&positions);
        let position = self.push_accessor(
            &floats_to_bytes(positions.iter().flatten()),
            TARGET_ARRAY_BUFFER,
            COMPONENT_FLOAT,
            positions.len(),
            "VEC3",
            Some((min.to_vec(), max.to_vec())),
        );
        let normal = with_normal.then(|| {
            self.push_accessor(
                &floats_to_bytes(normals.iter().flatten()),
                TARGET_ARRAY_BUFFER,
                COMPONENT_FLOAT,
                normals.len(),
                "VEC3",
                None,
            )
        });
        let texcoord_0 = with_uv.then(|| {
            self.push_accessor(
                &floats_to_bytes(uvs.iter().flatten()),
                TARGET_ARRAY_BUFFER,
                COMPONENT_FLOAT,
                uvs.len(),
                "VEC2",
                None,
            )
        });
        let index_bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let index_accessor = self.push_accessor(
            &index_bytes,
            TARGET_ELEMENT_ARRAY_BUFFER,
            COMPONENT_UNSIGNED_INT,
            indices.len(),
            "SCALAR",
            None,
        );

        let material = group.material.as_deref().and_then(|name| self.material(name));

        self.summary.vertices += positions.len();
        self.summary.triangles += group.triangles.len();
        self.summary.primitives += 1;

        self.primitives.push(Primitive {
            attributes: Attributes {
                position,
                normal,
                texcoord_0,
            },
            indices: index_accessor,
            material,
            mode: MODE_TRIANGLES,
        });
    }

    fn material(&mut self, name: &str) -> Option<usize> {
        if let Some(index) = self.material_index.get(name) {
            return *index;
        }

        let library = self.library;
        let index = match library.get(name) {
            Some(mtl) => Some(self.push_material(mtl)),
            None => {
                warn!(material = name, "Mesh uses undefined material, leaving untextured");
                None
            }
        };
        self.material_index.insert(name.to_string(), index);
        index
    }

    fn push_material(&mut self, mtl: &MtlMaterial) -> usize {
        let base_color_texture = mtl
            .diffuse_map
            .as_deref()
            .and_then(|reference| self.texture(reference))
            .map(|index| TextureInfo { index });

        let [r, g, b] = mtl.diffuse;
        self.materials.push(Material {
            name: mtl.name.clone(),
            pbr_metallic_roughness: PbrMetallicRoughness {
                base_color_factor: [r, g, b, mtl.alpha],
                base_color_texture,
                metallic_factor: 0.0,
                roughness_factor: 1.0,
            },
            alpha_mode: (mtl.alpha < 1.0).then_some("BLEND"),
            double_sided: self.assembler.double_sided,
        });
        self.summary.materials += 1;
        self.materials.len() - 1
    }

    fn texture(&mut self, reference: &str) -> Option<usize> {
        let name = base_name(reference);
        let key = name.to_ascii_lowercase();
        if let Some(index) = self.texture_index.get(&key) {
            return *index;
        }

        let textures = self.textures;
        let index = match textures.find(name) {
            Some(texture) => match texture.format {
                Some(format) => {
                    let buffer_view = self.push_view(&texture.output, None);
                    self.images.push(Image {
                        name: Some(texture.name.clone()),
                        buffer_view,
                        mime_type: format.mime_type(),
                    });
                    // All textures share sampler 0.
                    self.gltf_textures.push(Texture {
                        sampler: 0,
                        source: self.images.len() - 1,
                    });
                    self.summary.textures += 1;
                    Some(self.gltf_textures.len() - 1)
                }
                None => {
                    warn!(texture = name, "Texture format unknown, not embedding");
                    None
                }
            },
            None => {
                warn!(texture = reference, "Material references a texture missing from the archive");
                None
            }
        };
        self.texture_index.insert(key, index);
        index
    }

    fn finish(self) -> (Document, Vec<u8>, AssetSummary) {
        let has_mesh = !self.primitives.is_empty();

        let document = Document {
            asset: Asset {
                version: "2.0",
                generator: self.assembler.generator.clone(),
            },
            scene: 0,
            scenes: vec![Scene {
                nodes: if has_mesh { vec![0] } else { Vec::new() },
            }],
            nodes: if has_mesh {
                vec![Node {
                    name: Some("model".to_string()),
                    mesh: 0,
                }]
            } else {
                Vec::new()
            },
            meshes: if has_mesh {
                vec![Mesh {
                    name: Some("model".to_string()),
                    primitives: self.primitives,
                }]
            } else {
                Vec::new()
            },
            materials: self.materials,
            samplers: if self.gltf_textures.is_empty() {
                Vec::new()
            } else {
                vec![Sampler::default()]
            },
            textures: self.gltf_textures,
            images: self.images,
            accessors: self.accessors,
            buffer_views: self.buffer_views,
            buffers: if self.bin.is_empty() {
                Vec::new()
            } else {
                vec![Buffer {
                    byte_length: self.bin.len(),
                }]
            },
        };

        (document, self.bin, self.summary)
    }
}

fn floats_to_bytes<'v>(values: impl Iterator<Item = &'v f32>) -> Vec<u8> {
    values.flat_map(|v| v.to_le_bytes()).collect()
}

fn normalize([x, y, z]: [f32; 3]) -> [f32; 3] {
    let len = (x * x + y * y + z * z).sqrt();
    if len > 0.0 {
        [x / len, y / len, z / len]
    } else {
        [x, y, z]
    }
}

fn bounds(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for p in positions {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glb::parse_glb;
    use crate::texture::TextureTranscoder;
    use image::{Rgb, RgbImage};
    use serde_json::Value;
    use std::io::Cursor;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 1\nvt 0 0\nvt 1 0\nvt 0 1\n\
                            usemtl material0\nf 1/1 2/2 3/3\n";

    fn report_with(name: &str, width: u32, height: u32) -> TranscodeReport {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 200, 30]));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        vec![TextureTranscoder::default().transcode(name, Bytes::from(cursor.into_inner()))]
            .into_iter()
            .collect()
    }

    fn json_of(asset: &AssembledAsset) -> Value {
        let chunks = parse_glb(asset.bytes()).unwrap();
        serde_json::from_slice(chunks.json).unwrap()
    }

    #[test]
    fn test_textured_triangle() {
        let report = report_with("tex1.png", 8, 8);
        let asset = AssetAssembler::new()
            .assemble(TRIANGLE, Some("newmtl material0\nKd 1 1 1\nmap_Kd tex1.PNG\n"), &report)
            .unwrap();

        assert_eq!(&asset.bytes()[..4], b"glTF");
        assert_eq!(asset.content_type(), "model/gltf-binary");

        let summary = asset.summary();
        assert_eq!(summary.vertices, 3);
        assert_eq!(summary.triangles, 1);
        assert_eq!(summary.materials, 1);
        assert_eq!(summary.textures, 1);
        assert_eq!(summary.byte_length, asset.len());

        let json = json_of(&asset);
        assert_eq!(json["asset"]["version"], "2.0");
        assert_eq!(json["materials"].as_array().unwrap().len(), 1);
        assert_eq!(
            json["materials"][0]["pbrMetallicRoughness"]["baseColorTexture"]["index"],
            0
        );
        assert_eq!(json["images"][0]["mimeType"], "image/png");
        assert!(json["images"][0].get("uri").is_none());
        assert_eq!(json["samplers"][0]["minFilter"], 9987);

        let attributes = &json["meshes"][0]["primitives"][0]["attributes"];
        assert!(attributes.get("TEXCOORD_0").is_some());
        assert!(attributes.get("NORMAL").is_none());
    }

    #[test]
    fn test_geometry_only() {
        let mesh = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3\nf 2 4 3\n";
        let asset = AssetAssembler::new()
            .assemble(mesh, None, &TranscodeReport::default())
            .unwrap();

        let json = json_of(&asset);
        assert!(json.get("materials").is_none());
        assert!(json.get("textures").is_none());
        assert!(json.get("images").is_none());
        assert!(json["meshes"][0]["primitives"][0].get("material").is_none());
        assert_eq!(asset.summary().vertices, 4);
        assert_eq!(asset.summary().triangles, 2);
    }

    #[test]
    fn test_z_up_is_converted() {
        let mesh = "v 0 0 0\nv 1 0 0\nv 0 2 5\nf 1 2 3\n";
        let asset = AssetAssembler::new()
            .assemble(mesh, None, &TranscodeReport::default())
            .unwrap();
        let json = json_of(&asset);
        let accessor = &json["accessors"][0];
        assert_eq!(accessor["min"], serde_json::json!([0.0, 0.0, -2.0]));
        assert_eq!(accessor["max"], serde_json::json!([1.0, 5.0, 0.0]));

        let y_up = AssetAssembler::new()
            .with_up_axis(UpAxis::Y)
            .assemble(mesh, None, &TranscodeReport::default())
            .unwrap();
        let json = json_of(&y_up);
        assert_eq!(json["accessors"][0]["max"], serde_json::json!([1.0, 2.0, 5.0]));
    }

    #[test]
    fn test_vertices_are_shared() {
        let mesh = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let asset = AssetAssembler::new()
            .assemble(mesh, None, &TranscodeReport::default())
            .unwrap();
        assert_eq!(asset.summary().vertices, 4);
        assert_eq!(asset.summary().triangles, 2);
    }

    #[test]
    fn test_partial_uvs_are_dropped() {
        let mesh = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2/1 3\n";
        let asset = AssetAssembler::new()
            .assemble(mesh, None, &TranscodeReport::default())
            .unwrap();
        let json = json_of(&asset);
        assert!(json["meshes"][0]["primitives"][0]["attributes"]
            .get("TEXCOORD_0")
            .is_none());
    }

    #[test]
    fn test_missing_texture_keeps_material() {
        let asset = AssetAssembler::new()
            .assemble(
                TRIANGLE,
                Some("newmtl material0\nd 0.5\nmap_Kd gone.png\n"),
                &TranscodeReport::default(),
            )
            .unwrap();
        let json = json_of(&asset);
        let material = &json["materials"][0];
        assert!(material["pbrMetallicRoughness"].get("baseColorTexture").is_none());
        assert_eq!(material["alphaMode"], "BLEND");
        assert_eq!(asset.summary().textures, 0);
    }

    #[test]
    fn test_unused_materials_are_not_emitted() {
        let asset = AssetAssembler::new()
            .assemble(
                TRIANGLE,
                Some("newmtl unused\nKd 1 0 0\nnewmtl material0\nKd 0 1 0\n"),
                &TranscodeReport::default(),
            )
            .unwrap();
        let json = json_of(&asset);
        assert_eq!(json["materials"].as_array().unwrap().len(), 1);
        assert_eq!(json["materials"][0]["name"], "material0");
    }

    #[test]
    fn test_empty_mesh_is_valid_glb() {
        let asset = AssetAssembler::new()
            .assemble("# nothing here\n", None, &TranscodeReport::default())
            .unwrap();
        let chunks = parse_glb(asset.bytes()).unwrap();
        assert!(chunks.bin.is_none());
        let json: Value = serde_json::from_slice(chunks.json).unwrap();
        assert!(json.get("meshes").is_none());
        assert_eq!(json["scenes"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_geometry_fails() {
        let err = AssetAssembler::new()
            .assemble("v 0 0 0\nf 1 2 3\n", None, &TranscodeReport::default())
            .unwrap_err();
        assert!(matches!(err, AssembleError::IndexOutOfRange { .. }));
    }

    #[test]
    fn test_up_axis_from_str() {
        assert_eq!("Z".parse::<UpAxis>().unwrap(), UpAxis::Z);
        assert_eq!(" y ".parse::<UpAxis>().unwrap(), UpAxis::Y);
        assert!("x".parse::<UpAxis>().is_err());
    }
}
