//! GLB asset assembly.
//!
//! Turns relinked OBJ text, its optional MTL material library and the
//! transcoded textures into a single self-contained glTF 2.0 binary. Images
//! are always embedded in the binary chunk.

mod assemble;
mod container;
mod document;
mod error;
mod mtl;
mod obj;

pub use assemble::{
    AssembledAsset, AssetAssembler, AssetSummary, UpAxis, CONTENT_TYPE, FALLBACK_CONTENT_TYPE,
};
pub use container::{parse_glb, write_glb, GlbChunks, GLB_MAGIC, GLB_VERSION};
pub use error::{AssembleError, InvalidGlb};
pub use mtl::{parse_mtl, MaterialLibrary, MtlMaterial};
pub use obj::{parse_obj, Corner, FaceGroup, ObjModel};
