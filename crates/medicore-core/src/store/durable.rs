// ── Durable warm-start storage ──
//
// One JSON entry per collection, written after every successful fetch and
// read once when a store is built. Contents are advisory: a reload shows
// the last known list while the real fetch is still owed.

use std::io::{self, Write};
use std::path::PathBuf;

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Same-origin key/value storage for collection snapshots.
pub trait DurableStore: Send + Sync {
    fn read(&self, key: &str) -> io::Result<Option<String>>;

    fn write(&self, key: &str, value: &str) -> io::Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DurableStore for FileStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        // Each writer gets its own temp file; the rename is the commit.
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{key}."))
            .suffix(".json.tmp")
            .tempfile_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }
}

/// In-process storage, for tests and for running without a cache dir.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Read and decode a stored collection. Missing, unreadable, or
/// incompatible entries all come back as `None`.
pub(crate) fn load<T: DeserializeOwned>(store: &dyn DurableStore, key: &str) -> Option<Vec<T>> {
    let raw = match store.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "durable cache unreadable");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(items) => Some(items),
        Err(e) => {
            debug!(key, error = %e, "ignoring incompatible durable cache entry");
            None
        }
    }
}

/// Encode and store a collection. Failures are logged, never raised.
pub(crate) fn save<T: Serialize>(store: &dyn DurableStore, key: &str, items: &[T]) {
    let encoded = match serde_json::to_string(items) {
        Ok(s) => s,
        Err(e) => {
            warn!(key, error = %e, "could not encode collection for durable cache");
            return;
        }
    };
    if let Err(e) = store.write(key, &encoded) {
        warn!(key, error = %e, "could not write durable cache");
    }
}
