//! TextureEncoder trait and the PNG/JPEG implementations.
//!
//! The transcoder picks an encoder by the texture's [`RasterFormat`]; the
//! trait exists so tests and callers can substitute their own.
//!
//! # Example
//!
//! ```
//! use meshbake::texture::{JpegTextureEncoder, RasterFormat, TextureEncoder};
//! use std::sync::Arc;
//!
//! let encoder: Arc<dyn TextureEncoder> = Arc::new(JpegTextureEncoder::new(80));
//! assert_eq!(encoder.format(), RasterFormat::Jpeg);
//!
//! let image = image::DynamicImage::new_rgb8(8, 8);
//! let bytes = encoder.encode(&image).unwrap();
//! assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
//! ```

use super::{RasterFormat, TextureError};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::DynamicImage;
use std::sync::Arc;

/// Encodes a decoded image back into a raster container.
///
/// Implementations must be `Send + Sync`: a batch of textures is encoded
/// on a shared worker pool.
pub trait TextureEncoder: Send + Sync {
    /// Encode the image into a complete file (headers included).
    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, TextureError>;

    /// The format this encoder produces.
    fn format(&self) -> RasterFormat;

    /// Human-readable encoder name for logs.
    fn name(&self) -> &str;
}

impl<T: TextureEncoder + ?Sized> TextureEncoder for Arc<T> {
    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, TextureError> {
        (**self).encode(image)
    }

    fn format(&self) -> RasterFormat {
        (**self).format()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Lossless PNG encoder.
#[derive(Debug, Clone)]
pub struct PngTextureEncoder {
    compression_level: u8,
}

impl PngTextureEncoder {
    /// Creates an encoder for a zlib-style level 0-9 (9 = smallest output).
    pub fn new(compression_level: u8) -> Self {
        Self {
            compression_level: compression_level.min(9),
        }
    }

    fn compression(&self) -> CompressionType {
        match self.compression_level {
            0..=2 => CompressionType::Fast,
            3..=7 => CompressionType::Default,
            _ => CompressionType::Best,
        }
    }
}

impl TextureEncoder for PngTextureEncoder {
    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, TextureError> {
        // PNG supports 8/16-bit gray and color directly; float images are
        // narrowed to 8-bit RGBA.
        let converted;
        let image = match image {
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_) => image,
            other => {
                converted = DynamicImage::ImageRgba8(other.to_rgba8());
                &converted
            }
        };

        let mut buffer = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut buffer, self.compression(), PngFilter::Adaptive);
        image
            .write_with_encoder(encoder)
            .map_err(|source| TextureError::Encode {
                format: "PNG",
                source,
            })?;
        Ok(buffer)
    }

    fn format(&self) -> RasterFormat {
        RasterFormat::Png
    }

    fn name(&self) -> &str {
        "PNG"
    }
}

/// Lossy JPEG encoder. Alpha is discarded.
#[derive(Debug, Clone)]
pub struct JpegTextureEncoder {
    quality: u8,
}

impl JpegTextureEncoder {
    /// Creates an encoder with quality clamped to 1-100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl TextureEncoder for JpegTextureEncoder {
    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, TextureError> {
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        rgb.write_with_encoder(encoder)
            .map_err(|source| TextureError::Encode {
                format: "JPEG",
                source,
            })?;
        Ok(buffer)
    }

    fn format(&self) -> RasterFormat {
        RasterFormat::Jpeg
    }

    fn name(&self) -> &str {
        "JPEG"
    }
}
