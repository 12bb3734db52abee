//! Result cache for assembled assets.
//!
//! Finished GLB files are stored on disk keyed by (project id, job id) so
//! that repeated requests for the same job never rerun the pipeline.
//! Entries are written once, atomically, and never evicted.

mod path;
mod result;
mod stats;
mod types;

pub use path::{cache_path, project_directory, CACHE_EXTENSION};
pub use result::{PutOutcome, ResultCache};
pub use stats::{CacheStatistics, CacheStats};
pub use types::{default_cache_dir, CacheError};
