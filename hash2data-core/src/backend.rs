//! Persistence backends for the serialized entry sequence
//!
//! A backend is keyed byte storage: one slot per store name. The store reads
//! its slot once when it opens and overwrites it after every mutation.
//!
//! Backends do not coordinate concurrent writers. Two stores open on the same
//! slot at the same time will overwrite each other's changes; callers that
//! share a backend must keep one active store per slot.

use dashmap::DashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::BackendError;

/// Keyed storage for serialized entry sequences
pub trait PersistenceBackend: Send + Sync {
    /// Returns the bytes stored under `name`, or `None` if the slot is empty
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, BackendError>;

    /// Replaces the bytes stored under `name`
    fn put(&self, name: &str, bytes: &[u8]) -> Result<(), BackendError>;
}

struct MemoryBackendInner {
    slots: DashMap<String, Vec<u8>>,
    /// Number of successful `put` calls
    writes: AtomicUsize,
}

/// In-memory session map
///
/// Cloning is cheap and clones share the same slots, so a clone can stand in
/// for the session object handed to each request.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryBackendInner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryBackendInner {
                slots: DashMap::new(),
                writes: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns the number of writes performed across all slots
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::Relaxed)
    }

    /// Drops a slot, returning whether it existed
    pub fn remove(&self, name: &str) -> bool {
        self.inner.slots.remove(name).is_some()
    }

    /// Returns the number of slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("slots", &self.inner.slots.len())
            .field("writes", &self.writes())
            .finish()
    }
}

impl PersistenceBackend for MemoryBackend {
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self.inner.slots.get(name).map(|bytes| bytes.value().clone()))
    }

    fn put(&self, name: &str, bytes: &[u8]) -> Result<(), BackendError> {
        self.inner.slots.insert(name.to_string(), bytes.to_vec());
        self.inner.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// One JSON file per slot under a root directory
///
/// Slot `name` lives at `<root>/<name>.json`. Writes go to a temporary
/// sibling first and are renamed into place. A failed rename removes the
/// temporary file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at `root`, creating the directory if needed
    pub fn open(root: impl AsRef<Path>) -> Result<Self, BackendError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| BackendError::Io {
            name: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, name: &str) -> Result<PathBuf, BackendError> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0']);
        if invalid {
            return Err(BackendError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(self.root.join(format!("{name}.json")))
    }
}

impl PersistenceBackend for FileBackend {
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let path = self.slot_path(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(BackendError::Io {
                name: name.to_string(),
                source,
            }),
        }
    }

    fn put(&self, name: &str, bytes: &[u8]) -> Result<(), BackendError> {
        let path = self.slot_path(name)?;
        let tmp_path = path.with_extension("json.tmp");
        let io_err = |source| BackendError::Io {
            name: name.to_string(),
            source,
        };

        fs::write(&tmp_path, bytes).map_err(io_err)?;
        if let Err(source) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_err(source));
        }
        Ok(())
    }
}
