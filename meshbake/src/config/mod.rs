//! User configuration for meshbake.
//!
//! Settings live in `~/.meshbake/config.ini`, one INI section per concern:
//!
//! | Section      | Controls                                         |
//! |--------------|--------------------------------------------------|
//! | `[remote]`   | processing node URL, timeouts, archive limits    |
//! | `[watcher]`  | poll interval and transient retry budget         |
//! | `[texture]`  | max texture size, quality, compression, workers  |
//! | `[archive]`  | which archive entries count as mesh and material |
//! | `[cache]`    | result cache directory                           |
//! | `[pipeline]` | up axis, double-sided materials, work dirs       |
//! | `[logging]`  | log file and verbosity                           |
//!
//! A missing file yields defaults; a missing key keeps its default. The
//! typed settings convert into the library's runtime configs with
//! [`ConfigFile::pipeline_config`], [`ConfigFile::watcher_config`] and
//! [`ConfigFile::remote_config`].
//!
//! # Example
//!
//! ```
//! use meshbake::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let pipeline = config.pipeline_config();
//! assert_eq!(pipeline.transcode.max_width, 1024);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod size;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ArchiveSettings, CacheSettings, ConfigFile, LoggingSettings, PipelineSettings,
    RemoteSettings, TextureSettings, WatcherSettings,
};
pub use size::{format_size, parse_size, SizeParseError};
