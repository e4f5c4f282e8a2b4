use crate::cache::{CacheEntry, FlagCache};
use crate::constants::CACHE_FILE_PREFIX;
use crate::errors::ErrorKind::CacheFailure;
use crate::utils::sha1;
use chrono::Utc;
use log::warn;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
enum DiskError {
    #[error("I/O error on '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Corrupt cache file '{path}': {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// [`FlagCache`] that keeps one JSON file per key inside a directory, so cached
/// catalogues survive restarts.
///
/// Writes land in a temporary file next to the target first and are renamed into
/// place, readers never observe half-written entries.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use featurit::{ClientBuilder, DiskCache};
///
/// let client = ClientBuilder::new("tenant", "api-key")
///     .backup_cache(Arc::new(DiskCache::new("/var/cache/featurit")))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Creates a cache rooted at `dir`. The directory is created on the first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{CACHE_FILE_PREFIX}_{}.json", sha1(key)))
    }

    fn read(&self, key: &str) -> Result<Option<CacheEntry>, DiskError> {
        let path = self.path_of(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(DiskError::Io { path, source }),
        };
        let entry: CacheEntry = serde_json::from_str(&content)
            .map_err(|source| DiskError::Corrupt { path: path.clone(), source })?;
        // left in place, a concurrent set may already have replaced it
        if entry.is_expired(Utc::now().timestamp_millis()) {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn write(&self, key: &str, entry: &CacheEntry) -> Result<(), DiskError> {
        let io_err = |source| DiskError::Io {
            path: self.dir.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        let json = serde_json::to_vec(entry).map_err(|source| DiskError::Corrupt {
            path: tmp.path().to_path_buf(),
            source,
        })?;
        tmp.write_all(&json).map_err(io_err)?;
        let path = self.path_of(key);
        tmp.persist(&path)
            .map_err(|err| DiskError::Io { path, source: err.error })?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), DiskError> {
        let path = self.path_of(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(DiskError::Io { path, source }),
        }
    }
}

impl FlagCache for DiskCache {
    fn get(&self, key: &str) -> Option<String> {
        match self.read(key) {
            Ok(entry) => entry.map(|entry| entry.value),
            Err(err) => {
                warn!(event_id = CacheFailure.as_u16(); "Reading '{key}' from the disk cache failed. {err}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        if let Err(err) = self.write(key, &CacheEntry::new(value, ttl)) {
            warn!(event_id = CacheFailure.as_u16(); "Writing '{key}' to the disk cache failed. {err}");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(err) = self.delete(key) {
            warn!(event_id = CacheFailure.as_u16(); "Removing '{key}' from the disk cache failed. {err}");
        }
    }
}
