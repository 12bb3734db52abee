use thiserror::Error;

/// Per-texture transcoding errors.
#[derive(Debug, Error)]
pub enum TextureError {
    /// File name and content match no supported raster format.
    #[error("unsupported raster format for '{0}'")]
    UnsupportedFormat(String),

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode {format} image: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
}
