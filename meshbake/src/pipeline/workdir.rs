//! Scoped per-conversion work directory.

use crate::job::JobKey;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Temporary directory owned by one conversion.
///
/// Removed when dropped, on success and failure alike, unless created with
/// `retain` set. A retained directory stays on disk together with every
/// artifact written into it, which makes a failed conversion easy to
/// inspect.
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
    retain: bool,
}

impl WorkDir {
    pub fn create(root: Option<&Path>, key: &JobKey, retain: bool) -> io::Result<Self> {
        let prefix = format!("meshbake-{}-{}-", key.project_id(), key.job_id());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).disable_cleanup(retain);

        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        debug!(job = %key, path = %dir.path().display(), retain, "Work directory created");
        Ok(Self { dir, retain })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn is_retained(&self) -> bool {
        self.retain
    }

    /// Writes a stage artifact when retaining, otherwise does nothing.
    ///
    /// Failures are logged and swallowed; artifacts are a debugging aid.
    pub fn write_artifact(&self, name: &str, data: &[u8]) {
        if !self.retain {
            return;
        }
        let path = self.dir.path().join(name);
        let result = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| fs::write(&path, data));
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Failed to write stage artifact");
        }
    }

    /// Ends the conversion's use of the directory.
    ///
    /// Returns the path if it was retained; otherwise the directory is
    /// removed.
    pub fn finish(self) -> Option<PathBuf> {
        self.retain.then(|| self.dir.path().to_path_buf())
    }
}
