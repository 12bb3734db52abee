//! Texture transcoding.
//!
//! Photogrammetry exports ship textures at whatever resolution the
//! texturing step produced, often 8k or more. Before embedding them in the
//! GLB each one is decoded, shrunk to fit a configured bound and
//! re-encoded in its original raster format.
//!
//! A texture that fails to decode or encode is never fatal: the original
//! bytes are carried through and the failure is recorded in the
//! [`TranscodeReport`].

mod encoder;
mod error;
mod format;
mod transcode;

pub use encoder::{JpegTextureEncoder, PngTextureEncoder, TextureEncoder};
pub use error::TextureError;
pub use format::RasterFormat;
pub use transcode::{
    fit_within, TextureOutcome, TextureTranscoder, TranscodeConfig, TranscodeReport,
    TranscodeStats, TranscodedTexture, DEFAULT_COMPRESSION_LEVEL, DEFAULT_MAX_DIMENSION,
    DEFAULT_QUALITY, DEFAULT_WORKERS,
};
