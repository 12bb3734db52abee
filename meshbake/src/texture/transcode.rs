//! Batch texture transcoding on a bounded worker pool.

use super::{
    JpegTextureEncoder, PngTextureEncoder, RasterFormat, TextureEncoder, TextureError,
};
use crate::job::JobOptions;
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default bound for both texture dimensions.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 80;

/// Default PNG compression level (maximum).
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 9;

/// Default number of concurrent texture workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Texture transcoding parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
    /// PNG compression level, 0-9.
    pub compression_level: u8,
    /// Worker threads used for one batch.
    pub workers: usize,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_DIMENSION,
            max_height: DEFAULT_MAX_DIMENSION,
            quality: DEFAULT_QUALITY,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl TranscodeConfig {
    /// Applies per-job overrides.
    ///
    /// Recognized options: `texture-max-size` (both dimensions),
    /// `texture-quality` and `texture-compression-level`.
    pub fn with_options(mut self, options: &JobOptions) -> Self {
        if let Some(size) = options.get_u32("texture-max-size") {
            let size = size.max(1);
            self.max_width = size;
            self.max_height = size;
        }
        if let Some(quality) = options.get_u32("texture-quality") {
            self.quality = quality.clamp(1, 100) as u8;
        }
        if let Some(level) = options.get_u32("texture-compression-level") {
            self.compression_level = level.min(9) as u8;
        }
        self
    }
}

/// Computes dimensions that fit within `max_width`×`max_height` while
/// preserving aspect ratio. Never upscales.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let max_width = max_width.max(1);
    let max_height = max_height.max(1);

    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let w = ((width as f64 * scale).floor() as u32).clamp(1, max_width);
    let h = ((height as f64 * scale).floor() as u32).clamp(1, max_height);
    (w, h)
}

/// What happened to one texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureOutcome {
    /// Shrunk to fit the bound.
    Resized,
    /// Already within bounds; re-encoded smaller.
    Recompressed,
    /// Already within bounds and re-encoding did not help; original kept.
    Unchanged,
    /// Decode or encode failed; original kept.
    Failed(String),
}

/// One transcoded texture.
#[derive(Debug, Clone)]
pub struct TranscodedTexture {
    /// Base file name the texture was stored under.
    pub name: String,
    pub format: Option<RasterFormat>,
    pub original: Bytes,
    /// Bytes to embed: transcoded output or the original.
    pub output: Bytes,
    pub original_dimensions: Option<(u32, u32)>,
    /// Dimensions of `output`, when known.
    pub dimensions: Option<(u32, u32)>,
    pub outcome: TextureOutcome,
}

impl TranscodedTexture {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, TextureOutcome::Failed(_))
    }

    fn failed(name: &str, format: Option<RasterFormat>, data: Bytes, error: &TextureError) -> Self {
        Self {
            name: name.to_string(),
            format,
            output: data.clone(),
            original: data,
            original_dimensions: None,
            dimensions: None,
            outcome: TextureOutcome::Failed(error.to_string()),
        }
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TranscodeStats {
    pub count: usize,
    pub resized: usize,
    pub failed: usize,
    pub original_bytes: u64,
    pub output_bytes: u64,
}

impl TranscodeStats {
    /// Size reduction as a percentage of the original total.
    pub fn reduction_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.output_bytes as f64 / self.original_bytes as f64) * 100.0
    }
}

impl fmt::Display for TranscodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} textures ({} resized, {} failed), {} -> {} bytes ({:.1}% reduction)",
            self.count,
            self.resized,
            self.failed,
            self.original_bytes,
            self.output_bytes,
            self.reduction_percent()
        )
    }
}

/// Results of transcoding a batch, one entry per input texture.
#[derive(Debug, Clone, Default)]
pub struct TranscodeReport {
    textures: BTreeMap<String, TranscodedTexture>,
}

impl TranscodeReport {
    pub fn get(&self, name: &str) -> Option<&TranscodedTexture> {
        self.textures.get(name)
    }

    /// Looks up a texture by name ignoring ASCII case, preferring an exact
    /// match.
    pub fn find(&self, name: &str) -> Option<&TranscodedTexture> {
        self.textures.get(name).or_else(|| {
            self.textures
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, texture)| texture)
        })
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscodedTexture> {
        self.textures.values()
    }

    pub fn stats(&self) -> TranscodeStats {
        self.textures
            .values()
            .fold(TranscodeStats::default(), |mut stats, texture| {
                stats.count += 1;
                stats.original_bytes += texture.original.len() as u64;
                stats.output_bytes += texture.output.len() as u64;
                match texture.outcome {
                    TextureOutcome::Resized => stats.resized += 1,
                    TextureOutcome::Failed(_) => stats.failed += 1,
                    _ => {}
                }
                stats
            })
    }
}

impl FromIterator<TranscodedTexture> for TranscodeReport {
    fn from_iter<I: IntoIterator<Item = TranscodedTexture>>(iter: I) -> Self {
        Self {
            textures: iter.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }
}

/// Resizes and recompresses textures.
pub struct TextureTranscoder {
    config: TranscodeConfig,
    png: Arc<dyn TextureEncoder>,
    jpeg: Arc<dyn TextureEncoder>,
}

impl TextureTranscoder {
    pub fn new(config: TranscodeConfig) -> Self {
        let png = Arc::new(PngTextureEncoder::new(config.compression_level));
        let jpeg = Arc::new(JpegTextureEncoder::new(config.quality));
        Self { config, png, jpeg }
    }

    /// Replaces the encoder used for one format.
    pub fn with_encoder(mut self, encoder: Arc<dyn TextureEncoder>) -> Self {
        match encoder.format() {
            RasterFormat::Png => self.png = encoder,
            RasterFormat::Jpeg => self.jpeg = encoder,
        }
        self
    }

    pub fn config(&self) -> &TranscodeConfig {
        &self.config
    }

    fn encoder_for(&self, format: RasterFormat) -> &dyn TextureEncoder {
        match format {
            RasterFormat::Png => self.png.as_ref(),
            RasterFormat::Jpeg => self.jpeg.as_ref(),
        }
    }

    /// Transcodes one texture. Never fails; errors are logged and the
    /// original bytes are kept.
    pub fn transcode(&self, name: &str, data: Bytes) -> TranscodedTexture {
        let format = RasterFormat::detect(name, &data);
        match self.try_transcode(name, format, &data) {
            Ok(texture) => texture,
            Err(e) => {
                warn!(texture = name, error = %e, "Texture transcode failed, keeping original");
                TranscodedTexture::failed(name, format, data, &e)
            }
        }
    }

    fn try_transcode(
        &self,
        name: &str,
        format: Option<RasterFormat>,
        data: &Bytes,
    ) -> Result<TranscodedTexture, TextureError> {
        let format = format.ok_or_else(|| TextureError::UnsupportedFormat(name.to_string()))?;

        let image = ImageReader::with_format(Cursor::new(data.as_ref()), format.image_format())
            .decode()
            .map_err(TextureError::Decode)?;

        let original_dimensions = (image.width(), image.height());
        let target = fit_within(
            original_dimensions.0,
            original_dimensions.1,
            self.config.max_width,
            self.config.max_height,
        );
        let resized = target != original_dimensions;

        let image: DynamicImage = if resized {
            image.resize_exact(target.0, target.1, FilterType::Lanczos3)
        } else {
            image
        };

        let encoded = self.encoder_for(format).encode(&image)?;

        let (output, outcome) = if resized {
            (Bytes::from(encoded), TextureOutcome::Resized)
        } else if encoded.len() < data.len() {
            (Bytes::from(encoded), TextureOutcome::Recompressed)
        } else {
            (data.clone(), TextureOutcome::Unchanged)
        };

        debug!(
            texture = name,
            format = %format,
            from = ?original_dimensions,
            to = ?target,
            original_bytes = data.len(),
            output_bytes = output.len(),
            "Texture transcoded"
        );

        Ok(TranscodedTexture {
            name: name.to_string(),
            format: Some(format),
            original: data.clone(),
            output,
            original_dimensions: Some(original_dimensions),
            dimensions: Some(target),
            outcome,
        })
    }

    /// Transcodes a batch in parallel, bounded by the configured worker
    /// count. The report holds exactly one entry per input.
    pub fn transcode_all(&self, textures: &BTreeMap<String, Bytes>) -> TranscodeReport {
        if textures.is_empty() {
            return TranscodeReport::default();
        }

        let start = Instant::now();
        let workers = self.config.workers.max(1);

        let report: TranscodeReport = match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("meshbake-texture-{}", i))
            .build()
        {
            Ok(pool) => pool.install(|| {
                textures
                    .par_iter()
                    .map(|(name, data)| self.transcode(name, data.clone()))
                    .collect::<Vec<_>>()
                    .into_iter()
                    .collect()
            }),
            Err(e) => {
                warn!(error = %e, "Failed to build texture pool, transcoding sequentially");
                textures
                    .iter()
                    .map(|(name, data)| self.transcode(name, data.clone()))
                    .collect()
            }
        };

        let stats = report.stats();
        info!(
            count = stats.count,
            resized = stats.resized,
            failed = stats.failed,
            original_bytes = stats.original_bytes,
            output_bytes = stats.output_bytes,
            reduction_pct = stats.reduction_percent(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Textures transcoded"
        );

        report
    }
}

impl Default for TextureTranscoder {
    fn default() -> Self {
        Self::new(TranscodeConfig::default())
    }
}
