//! Default values for every configuration setting.

use super::file::config_directory;
use super::settings::*;
use crate::cache::default_cache_dir;
use crate::glb::UpAxis;
use crate::remote::{
    DEFAULT_ARCHIVE_NAME, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_MAX_ARCHIVE_BYTES, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::service::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::texture::{
    DEFAULT_COMPRESSION_LEVEL, DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY, DEFAULT_WORKERS,
};
use crate::watcher::{
    DEFAULT_MAX_TRANSIENT_RETRIES, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_STATUS_TIMEOUT_SECS,
};

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "meshbake.log";

/// Default mesh entry extension.
pub const DEFAULT_MESH_EXTENSION: &str = ".obj";

/// Default material entry suffix.
pub const DEFAULT_MATERIAL_SUFFIX: &str = ".mtl";

/// Largest accepted texture size setting.
pub const MAX_TEXTURE_SIZE: u32 = 16384;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            remote: RemoteSettings {
                url: DEFAULT_BASE_URL.to_string(),
                archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
                request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
                max_archive_size: DEFAULT_MAX_ARCHIVE_BYTES,
                token: None,
                service_token: None,
            },
            watcher: WatcherSettings {
                poll_interval: DEFAULT_POLL_INTERVAL_SECS,
                status_timeout: DEFAULT_STATUS_TIMEOUT_SECS,
                max_retries: DEFAULT_MAX_TRANSIENT_RETRIES,
            },
            texture: TextureSettings {
                max_size: DEFAULT_MAX_DIMENSION,
                quality: DEFAULT_QUALITY,
                compression_level: DEFAULT_COMPRESSION_LEVEL,
                workers: DEFAULT_WORKERS,
            },
            archive: ArchiveSettings {
                mesh_extension: DEFAULT_MESH_EXTENSION.to_string(),
                material_suffix: DEFAULT_MATERIAL_SUFFIX.to_string(),
            },
            cache: CacheSettings {
                directory: default_cache_dir(),
            },
            pipeline: PipelineSettings {
                up_axis: UpAxis::default(),
                double_sided: true,
                retain_artifacts: false,
                work_dir: None,
                fetch_timeout: DEFAULT_FETCH_TIMEOUT_SECS,
            },
            logging: LoggingSettings {
                file: config_directory().join(DEFAULT_LOG_FILE_NAME),
                debug: false,
            },
        }
    }
}
