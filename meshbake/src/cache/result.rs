//! On-disk result cache.

use super::path::{cache_path, project_directory};
use super::{CacheError, CacheStatistics, CacheStats};
use crate::job::JobKey;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of [`ResultCache::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// The entry was written.
    Stored(PathBuf),
    /// An entry already existed and was left untouched.
    AlreadyPresent(PathBuf),
}

impl PutOutcome {
    pub fn path(&self) -> &Path {
        match self {
            PutOutcome::Stored(path) | PutOutcome::AlreadyPresent(path) => path,
        }
    }
}

/// Durable (project id, job id) → GLB store.
///
/// Writers for the same key are serialized; different keys proceed in
/// parallel. Each entry is written to a temporary file in its destination
/// directory and renamed into place, so readers never observe a partial
/// file. An existing entry is never overwritten.
///
/// All methods block on filesystem I/O; async callers should run them on
/// a blocking thread.
pub struct ResultCache {
    cache_dir: PathBuf,
    locks: DashMap<JobKey, Arc<Mutex<()>>>,
    stats: CacheStats,
}

impl ResultCache {
    /// Opens a cache rooted at `cache_dir`, creating the directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)?;
        debug!(path = %cache_dir.display(), "Result cache opened");

        Ok(Self {
            cache_dir,
            locks: DashMap::new(),
            stats: CacheStats::new(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where the key's entry lives, whether or not it exists.
    pub fn path_for(&self, key: &JobKey) -> PathBuf {
        cache_path(&self.cache_dir, key)
    }

    pub fn contains(&self, key: &JobKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Reads a cached asset. A missing entry is `Ok(None)`.
    pub fn get(&self, key: &JobKey) -> Result<Option<Bytes>, CacheError> {
        match fs::read(self.path_for(key)) {
            Ok(data) => {
                self.stats.record_hit();
                debug!(job = %key, bytes = data.len(), "Result cache hit");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.stats.record_miss();
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stores an asset unless one already exists for the key.
    pub fn put(&self, key: &JobKey, data: &[u8]) -> Result<PutOutcome, CacheError> {
        let dir = project_directory(&self.cache_dir, key);
        fs::create_dir_all(&dir)?;
        let path = self.path_for(key);

        let lock = self.locks.entry(key.clone()).or_default().clone();
        let result = {
            let _guard = lock.lock();
            self.write_locked(&dir, &path, data)
        };
        drop(lock);
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);

        let outcome = result?;
        match &outcome {
            PutOutcome::Stored(path) => {
                self.stats.record_write(data.len());
                info!(job = %key, path = %path.display(), bytes = data.len(), "Cached result");
            }
            PutOutcome::AlreadyPresent(path) => {
                self.stats.record_duplicate_write();
                debug!(job = %key, path = %path.display(), "Result already cached");
            }
        }
        Ok(outcome)
    }

    fn write_locked(&self, dir: &Path, path: &Path, data: &[u8]) -> Result<PutOutcome, CacheError> {
        if path.exists() {
            return Ok(PutOutcome::AlreadyPresent(path.to_path_buf()));
        }

        let mut temp = tempfile::Builder::new()
            .prefix(".partial-")
            .suffix(".glb")
            .tempfile_in(dir)?;
        temp.write_all(data)?;
        temp.as_file().sync_all()?;

        // Another process may have raced us between the check and here.
        match temp.persist_noclobber(path) {
            Ok(_) => Ok(PutOutcome::Stored(path.to_path_buf())),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                Ok(PutOutcome::AlreadyPresent(path.to_path_buf()))
            }
            Err(e) => Err(CacheError::Persist {
                path: path.to_path_buf(),
                source: e.error,
            }),
        }
    }

    pub fn stats(&self) -> CacheStatistics {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    fn key(project: &str, job: &str) -> JobKey {
        JobKey::new(project, job).unwrap()
    }

    #[test]
    fn test_creates_base_dir() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("nested").join("cache");
        let cache = ResultCache::new(&base).unwrap();
        assert!(base.is_dir());
        assert_eq!(cache.cache_dir(), base.as_path());
    }

    #[test]
    fn test_get_missing_is_none() {
        let temp = TempDir::new().unwrap();
        let cache = ResultCache::new(temp.path()).unwrap();
        assert_eq!(cache.get(&key("1", "a")).unwrap(), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_put_then_get() {
        let temp = TempDir::new().unwrap();
        let cache = ResultCache::new(temp.path()).unwrap();
        let k = key("42", "job-1");

        let outcome = cache.put(&k, b"glTF-data").unwrap();
        assert_eq!(outcome, PutOutcome::Stored(temp.path().join("42").join("job-1.glb")));
        assert!(cache.contains(&k));
        assert_eq!(cache.get(&k).unwrap().unwrap().as_ref(), b"glTF-data");
    }

    #[test]
    fn test_never_overwrites() {
        let temp = TempDir::new().unwrap();
        let cache = ResultCache::new(temp.path()).unwrap();
        let k = key("42", "job-1");

        cache.put(&k, b"first").unwrap();
        let outcome = cache.put(&k, b"second").unwrap();

        assert!(matches!(outcome, PutOutcome::AlreadyPresent(_)));
        assert_eq!(cache.get(&k).unwrap().unwrap().as_ref(), b"first");
        let stats = cache.stats();
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.duplicate_writes, 1);
    }

    #[test]
    fn test_projects_are_separate() {
        let temp = TempDir::new().unwrap();
        let cache = ResultCache::new(temp.path()).unwrap();

        cache.put(&key("1", "same"), b"one").unwrap();
        cache.put(&key("2", "same"), b"two").unwrap();

        assert_eq!(cache.get(&key("1", "same")).unwrap().unwrap().as_ref(), b"one");
        assert_eq!(cache.get(&key("2", "same")).unwrap().unwrap().as_ref(), b"two");
    }

    #[test]
    fn test_no_partial_files_left() {
        let temp = TempDir::new().unwrap();
        let cache = ResultCache::new(temp.path()).unwrap();
        cache.put(&key("1", "a"), &[7u8; 4096]).unwrap();

        let names: Vec<String> = fs::read_dir(temp.path().join("1"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.glb".to_string()]);
    }

    #[test]
    fn test_concurrent_puts_store_once() {
        let temp = TempDir::new().unwrap();
        let cache = Arc::new(ResultCache::new(temp.path()).unwrap());
        let k = key("7", "racy");

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let k = k.clone();
                thread::spawn(move || cache.put(&k, &[i; 64]).unwrap())
            })
            .collect();
        let outcomes: Vec<PutOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let stored = outcomes
            .iter()
            .filter(|o| matches!(o, PutOutcome::Stored(_)))
            .count();
        assert_eq!(stored, 1);

        let data = cache.get(&k).unwrap().unwrap();
        assert_eq!(data.len(), 64);
        assert!(data.iter().all(|b| *b == data[0]));
        assert!(cache.locks.is_empty());
    }
}
