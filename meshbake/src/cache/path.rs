//! Cache path construction.

use crate::job::JobKey;
use std::path::{Path, PathBuf};

/// File extension of cached assets.
pub const CACHE_EXTENSION: &str = "glb";

/// Construct the path for a cached asset.
///
/// ```text
/// <cache_dir>/<project_id>/<job_id>.glb
/// ```
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use meshbake::cache::cache_path;
/// use meshbake::job::JobKey;
///
/// let key = JobKey::new("42", "3f2a").unwrap();
/// assert_eq!(
///     cache_path(&PathBuf::from("/cache"), &key),
///     PathBuf::from("/cache/42/3f2a.glb")
/// );
/// ```
pub fn cache_path(cache_dir: &Path, key: &JobKey) -> PathBuf {
    project_directory(cache_dir, key).join(format!("{}.{}", key.job_id(), CACHE_EXTENSION))
}

/// Directory holding every cached asset of the key's project.
pub fn project_directory(cache_dir: &Path, key: &JobKey) -> PathBuf {
    cache_dir.join(key.project_id())
}
