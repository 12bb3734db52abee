//! Settings structs, one per `[section]` of the config file.

use crate::archive::IngestRules;
use crate::glb::UpAxis;
use crate::job::Credential;
use crate::pipeline::PipelineConfig;
use crate::remote::RemoteConfig;
use crate::texture::TranscodeConfig;
use crate::watcher::WatcherConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub remote: RemoteSettings,
    pub watcher: WatcherSettings,
    pub texture: TextureSettings,
    pub archive: ArchiveSettings,
    pub cache: CacheSettings,
    pub pipeline: PipelineSettings,
    pub logging: LoggingSettings,
}

/// Processing node connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    /// Base URL of the processing node
    pub url: String,
    /// Archive file requested from finished jobs
    pub archive_name: String,
    /// Request timeout in seconds
    pub request_timeout: u64,
    /// Connect timeout in seconds
    pub connect_timeout: u64,
    /// Largest archive accepted, in bytes
    pub max_archive_size: u64,
    /// Bearer token for the `Authorization` header
    pub token: Option<String>,
    /// Service token sent as the `token` query parameter
    pub service_token: Option<String>,
}

/// Job status polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherSettings {
    /// Seconds between polls
    pub poll_interval: u64,
    /// Timeout for one status request, in seconds
    pub status_timeout: u64,
    /// Consecutive transient failures tolerated
    pub max_retries: u32,
}

/// Texture transcoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSettings {
    /// Largest width or height in pixels
    pub max_size: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
    /// PNG compression level (0-9)
    pub compression_level: u8,
    /// Worker threads per conversion
    pub workers: usize,
}

/// Archive entry selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSettings {
    pub mesh_extension: String,
    pub material_suffix: String,
}

/// Result cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub directory: PathBuf,
}

/// Conversion behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Up axis of the source geometry
    pub up_axis: UpAxis,
    pub double_sided: bool,
    /// Keep work directories and stage artifacts for debugging
    pub retain_artifacts: bool,
    /// Parent directory for work directories (system temp when unset)
    pub work_dir: Option<PathBuf>,
    /// Archive download timeout in seconds
    pub fetch_timeout: u64,
}

/// Logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
    /// Log at debug level instead of info
    pub debug: bool,
}

impl ConfigFile {
    /// Runtime pipeline configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            ingest: IngestRules {
                mesh_extension: self.archive.mesh_extension.clone(),
                material_suffix: self.archive.material_suffix.clone(),
            },
            transcode: TranscodeConfig {
                max_width: self.texture.max_size,
                max_height: self.texture.max_size,
                quality: self.texture.quality,
                compression_level: self.texture.compression_level,
                workers: self.texture.workers,
            },
            source_up_axis: self.pipeline.up_axis,
            double_sided: self.pipeline.double_sided,
            retain_artifacts: self.pipeline.retain_artifacts,
            work_root: self.pipeline.work_dir.clone(),
        }
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            poll_interval: Duration::from_secs(self.watcher.poll_interval),
            request_timeout: Duration::from_secs(self.watcher.status_timeout),
            max_transient_retries: self.watcher.max_retries,
        }
    }

    pub fn remote_config(&self) -> RemoteConfig {
        RemoteConfig {
            base_url: self.remote.url.clone(),
            archive_name: self.remote.archive_name.clone(),
            request_timeout: Duration::from_secs(self.remote.request_timeout),
            connect_timeout: Duration::from_secs(self.remote.connect_timeout),
            max_archive_bytes: self.remote.max_archive_size,
        }
    }

    /// Credentials from `[remote]`, anonymous when neither token is set.
    pub fn credential(&self) -> Credential {
        Credential::new(self.remote.token.clone(), self.remote.service_token.clone())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline.fetch_timeout)
    }
}
