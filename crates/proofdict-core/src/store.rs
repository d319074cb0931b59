//! Persisted dictionary cache.
//!
//! The cache is plain string key/value storage behind the [`Store`] trait so
//! the orchestrator can be tested without touching disk. [`DictionaryCache`]
//! layers the two fixed entries on top of it: the serialized dictionary and
//! the time it was fetched.
//!
//! Corrupt entries are never fatal: an unparsable dictionary is removed and
//! treated as absent, an unparsable timestamp reads as 0 (always expired).
//!
//! Stores are synchronous and may block on disk I/O. Async callers run them
//! on the blocking pool (see `Scanner::refresh`).

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use proofdict_config::record::{self, RawTerm};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Key of the cached dictionary JSON.
pub const DICTIONARY_KEY: &str = "proofdict";

/// Key of the fetch timestamp (decimal milliseconds since the Unix epoch).
pub const LAST_UPDATED_KEY: &str = "proofdict-lastUpdated";

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize dictionary: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// String-keyed persistent storage.
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// One file per key under a directory, created on first write.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if name.is_empty() || name.chars().all(|c| c == '.') {
            return self.dir.join("_".repeat(name.len().max(1)));
        }
        self.dir.join(name)
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let write_err = |source| StoreError::Write {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(write_err)?;

        // Each writer gets its own temp file in the same directory, then
        // renames it over the key. Readers see the old or the new value.
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(value.as_bytes()).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write { path, source }),
        }
    }
}

/// State of the dictionary entry as found by [`DictionaryCache::peek`].
#[derive(Debug, Clone, PartialEq)]
pub enum CachedDictionary {
    Absent,
    Corrupt,
    Valid(Vec<RawTerm>),
}

/// Typed view of the dictionary entries in a [`Store`].
pub struct DictionaryCache<'a> {
    store: &'a dyn Store,
}

impl<'a> DictionaryCache<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Fetch timestamp of the cached dictionary, 0 if absent or unreadable.
    pub fn last_updated(&self) -> u64 {
        match self.store.get(LAST_UPDATED_KEY) {
            Ok(Some(value)) => value.trim().parse().unwrap_or_else(|_| {
                warn!(value = %value, "Ignoring malformed cache timestamp");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!(error = %e, "Failed to read cache timestamp");
                0
            }
        }
    }

    /// The cached records, if present and parsable.
    ///
    /// A corrupt entry is removed from the store.
    pub fn read(&self) -> Option<Vec<RawTerm>> {
        match self.peek() {
            CachedDictionary::Valid(records) => Some(records),
            CachedDictionary::Absent => None,
            CachedDictionary::Corrupt => {
                warn!("Cached dictionary is corrupt, removing it");
                if let Err(e) = self.store.remove(DICTIONARY_KEY) {
                    warn!(error = %e, "Failed to remove corrupt cached dictionary");
                }
                None
            }
        }
    }

    /// Inspect the cached dictionary without changing the store.
    pub fn peek(&self) -> CachedDictionary {
        let json = match self.store.get(DICTIONARY_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => {
                debug!("No cached dictionary");
                return CachedDictionary::Absent;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read cached dictionary");
                return CachedDictionary::Absent;
            }
        };

        match record::parse_records(&json) {
            Ok(records) => CachedDictionary::Valid(records),
            Err(e) => {
                debug!(error = %e, "Cached dictionary does not parse");
                CachedDictionary::Corrupt
            }
        }
    }

    /// Store freshly fetched records and their fetch time.
    pub fn write(&self, records: &[RawTerm], fetched_at: u64) -> Result<(), StoreError> {
        let json = record::to_json(records)?;
        self.store.set(DICTIONARY_KEY, &json)?;
        self.store.set(LAST_UPDATED_KEY, &fetched_at.to_string())?;
        Ok(())
    }

    /// Remove both entries.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(DICTIONARY_KEY)?;
        self.store.remove(LAST_UPDATED_KEY)?;
        Ok(())
    }
}
