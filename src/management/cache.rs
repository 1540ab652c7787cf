use std::{fmt, io::ErrorKind, path::PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::warning;

pub const CACHE_PLAYLISTS: &str = "playlists";
pub const CACHE_SAVED_TRACKS: &str = "saved_tracks";
pub const CACHE_PLAYLISTED_TRACKS: &str = "playlisted_tracks";
pub const CACHE_UNPLAYLISTED_TRACKS: &str = "unplaylisted_tracks";
pub const CACHE_FLAGGED_TRACKS: &str = "flagged_tracks";

/// Derives the cache key for a year bucket's track list from its label.
pub fn bucket_cache_key(label: &str) -> String {
    format!("bucket_{}", label)
}

#[derive(Debug)]
pub enum CacheError {
    IoError(std::io::Error),
    SerdeError(serde_json::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::IoError(e) => write!(f, "cache io error: {}", e),
            CacheError::SerdeError(e) => write!(f, "cache serialization error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::IoError(err)
    }
}

/// Narrow key-value contract behind the cache store.
///
/// Keys are stable strings; values are opaque JSON documents. The default
/// backend is [`FileCache`], but anything honoring get/put/delete semantics
/// (an embedded database, a remote store) can stand in.
pub trait CacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn put(&self, key: &str, value: String) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn clear(&self) -> Result<(), CacheError>;
}

/// File-backed cache: one JSON file per key in a dedicated directory.
///
/// Absence of a file is equivalent to a cache miss. The directory is read
/// and written by a single process instance; there is no file locking, so
/// two concurrent runs race on cache files.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new() -> Self {
        let mut root = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        root.push("spotisort/cache");
        Self { root }
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for FileCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match async_fs::read_to_string(self.entry_path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::IoError(e)),
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<(), CacheError> {
        async_fs::create_dir_all(&self.root)
            .await
            .map_err(CacheError::IoError)?;
        async_fs::write(self.entry_path(key), value)
            .await
            .map_err(CacheError::IoError)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match async_fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            // invalidating an absent entry is a no-op, not an error
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::IoError(e)),
        }
    }

    async fn clear(&self) -> Result<(), CacheError> {
        match async_fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::IoError(e)),
        }
    }
}

/// Get-or-load memoization over named JSON-serializable collections.
///
/// An entry that is present and non-empty is trusted as-is; anything else
/// (absent file, empty snapshot, payload that fails shape validation) causes
/// the loader to run and its result to be persisted under the key.
pub struct CacheStore<B: CacheBackend = FileCache> {
    backend: B,
}

impl CacheStore<FileCache> {
    pub fn new() -> Self {
        Self {
            backend: FileCache::new(),
        }
    }
}

impl Default for CacheStore<FileCache> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: CacheBackend> CacheStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the collection stored under `key`, or invokes `loader`,
    /// persists its result and returns it.
    ///
    /// A cached payload is validated by deserializing it into the expected
    /// shape before it is trusted; a malformed payload is treated as a miss.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, loader: F) -> crate::Res<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = crate::Res<Vec<T>>>,
    {
        if let Some(raw) = self.backend.get(key).await? {
            match serde_json::from_str::<Vec<T>>(&raw) {
                Ok(cached) if !cached.is_empty() => return Ok(cached),
                Ok(_) => {} // empty snapshot is never trusted
                Err(e) => {
                    warning!("Cached payload for '{}' is malformed, reloading: {}", key, e)
                }
            }
        }

        let fresh = loader().await?;
        let json = serde_json::to_string_pretty(&fresh).map_err(CacheError::SerdeError)?;
        self.backend.put(key, json).await?;
        Ok(fresh)
    }

    /// Deletes the entry under `key`. Afterwards the next `get_or_load` for
    /// the key is guaranteed to invoke its loader. Deleting an absent entry
    /// succeeds silently.
    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.backend.delete(key).await
    }

    /// Empties the entire cache.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.backend.clear().await
    }
}
