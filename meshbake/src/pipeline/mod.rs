//! Archive-to-GLB conversion pipeline.
//!
//! One conversion runs these stages in order:
//!
//! ```text
//! archive bytes ──► ingest ──► relink ──► transcode ──► assemble ──► GLB
//! ```
//!
//! The pipeline is synchronous and CPU-bound: async callers run
//! [`convert_archive`] on a blocking thread. Texture transcoding fans out
//! over its own bounded worker pool; every other stage runs on the calling
//! thread.
//!
//! Every error is tagged with the job key and the stage it came from, see
//! [`PipelineError`].

mod config;
mod convert;
mod error;
pub mod stages;
mod workdir;

pub use config::PipelineConfig;
pub use convert::{convert_archive, ConversionOutput};
pub use error::{PipelineError, Stage, StageError};
pub use workdir::WorkDir;
