//! Durable state for the terminal front end.
//!
//! Prefers the state file under `state_dir`. If it exists but cannot be
//! read, the session runs on in-memory state instead of refusing to start.

use std::path::Path;

use openanimal_client::storage::{FileStore, KeyValueStore, MemoryStore};
use openanimal_client::StorageError;
use tracing::{info, warn};

/// File-backed state, or memory when the file is unusable.
#[derive(Debug)]
pub enum StateStore {
    /// Persisted across runs.
    File(FileStore),
    /// Lost on exit.
    Memory(MemoryStore),
}

impl StateStore {
    /// Open the state file at `path`, falling back to memory.
    pub fn open(path: &Path) -> Self {
        match FileStore::open(path) {
            Ok(store) => {
                info!(path = %path.display(), "client state file opened");
                Self::File(store)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "client state file unusable, state will not survive this run"
                );
                Self::Memory(MemoryStore::new())
            }
        }
    }
}

impl KeyValueStore for StateStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::File(store) => store.get(key),
            Self::Memory(store) => store.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            Self::File(store) => store.set(key, value),
            Self::Memory(store) => store.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::File(store) => store.remove(key),
            Self::Memory(store) => store.remove(key),
        }
    }
}
