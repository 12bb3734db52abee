use crate::archive::IngestRules;
use crate::glb::UpAxis;
use crate::job::JobOptions;
use crate::texture::TranscodeConfig;
use std::path::PathBuf;

/// Settings for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub ingest: IngestRules,
    pub transcode: TranscodeConfig,
    /// Up axis of the source geometry.
    pub source_up_axis: UpAxis,
    pub double_sided: bool,
    /// Keep the work directory and write every stage's output into it.
    pub retain_artifacts: bool,
    /// Parent for work directories; the system temp dir when `None`.
    pub work_root: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ingest: IngestRules::default(),
            transcode: TranscodeConfig::default(),
            source_up_axis: UpAxis::default(),
            double_sided: true,
            retain_artifacts: false,
            work_root: None,
        }
    }
}

impl PipelineConfig {
    /// Applies per-job option overrides.
    pub fn with_options(mut self, options: &JobOptions) -> Self {
        self.transcode = self.transcode.with_options(options);
        self
    }
}
