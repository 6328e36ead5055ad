//! Durable client state: a small key/value store and a cookie mirror.
//!
//! Storage is external and best-effort. A [`KeyValueStore`] may fail at any
//! call (file unwritable, storage disabled); [`BestEffortStore`] turns that
//! into an infallible capability by keeping an in-memory overlay, so a
//! failure downgrades to session-only state instead of propagating.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::cookie::Jar;
use tracing::{debug, warn};

use crate::error::StorageError;

/// Slot holding the anonymous identity token.
pub const ANON_ID_KEY: &str = "openanimal_anon_id";

/// Slot holding the last-seen wall-clock timestamp (milliseconds).
pub const LAST_SEEN_KEY: &str = "openanimal_last_seen";

/// Slot holding the authentication bearer credential.
pub const AUTH_TOKEN_KEY: &str = "openanimal_auth_token";

/// Prefix of the per-user slots holding a server-assigned creator key.
pub const USER_CREATOR_KEY_PREFIX: &str = "openanimal_creator:";

/// Slot holding the server-assigned creator key for `user_id`.
pub fn user_creator_key(user_id: &str) -> String {
    format!("{USER_CREATOR_KEY_PREFIX}{user_id}")
}

/// Cookie name mirroring the anonymous token for server-side correlation.
pub const ANON_COOKIE_NAME: &str = "openanimal_anon_id";

/// Cookie lifetime: one year.
const ANON_COOKIE_MAX_AGE_SECS: u64 = 31_536_000;

/// A string key/value store whose every operation may fail.
pub trait KeyValueStore {
    /// Read a slot.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a slot.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Clear a slot. Clearing an empty slot succeeds.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// Concrete stores
// ---------------------------------------------------------------------------

/// Process-lifetime store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: BTreeMap<String, String>,
}

impl MemoryStore {
    /// An empty store.
    pub const fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.slots.remove(key);
        Ok(())
    }
}

/// A store that refuses every operation, like browser storage that has
/// been disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStore;

impl KeyValueStore for DisabledStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}

/// A JSON object of string slots persisted to one file.
///
/// The file is read once on open and rewritten on every change through a
/// temporary sibling and a rename, so a crash never leaves it half-written.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    slots: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file exists but cannot be read or
    /// does not hold a JSON object of strings.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let slots = match std::fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            slots,
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.slots)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let previous = self.slots.insert(key.to_owned(), value.to_owned());
        if previous.as_deref() == Some(value) {
            return Ok(());
        }
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.slots.remove(key).is_none() {
            return Ok(());
        }
        self.flush()
    }
}

// ---------------------------------------------------------------------------
// Best-effort wrapper
// ---------------------------------------------------------------------------

/// Infallible view over a fallible store.
///
/// Writes always land in an in-memory overlay; reads prefer the overlay,
/// then the inner store. Inner failures are logged once and otherwise
/// ignored, so the session keeps working on in-memory state.
#[derive(Debug)]
pub struct BestEffortStore<S> {
    inner: S,
    overlay: BTreeMap<String, Option<String>>,
    degraded: bool,
}

impl<S: KeyValueStore> BestEffortStore<S> {
    /// Wrap a store.
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            overlay: BTreeMap::new(),
            degraded: false,
        }
    }

    /// Read a slot, falling back to session memory.
    pub fn get(&mut self, key: &str) -> Option<String> {
        if let Some(value) = self.overlay.get(key) {
            return value.clone();
        }
        match self.inner.get(key) {
            Ok(value) => value,
            Err(e) => {
                self.note_failure("read", key, &e);
                None
            }
        }
    }

    /// Write a slot. Always succeeds for the session.
    pub fn set(&mut self, key: &str, value: &str) {
        self.overlay.insert(key.to_owned(), Some(value.to_owned()));
        if let Err(e) = self.inner.set(key, value) {
            self.note_failure("write", key, &e);
        }
    }

    /// Clear a slot. Always succeeds for the session.
    pub fn remove(&mut self, key: &str) {
        self.overlay.insert(key.to_owned(), None);
        if let Err(e) = self.inner.remove(key) {
            self.note_failure("remove", key, &e);
        }
    }

    /// Whether any inner operation has failed this session.
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Borrow the wrapped store.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    fn note_failure(&mut self, op: &str, key: &str, error: &StorageError) {
        if self.degraded {
            debug!(op, key, error = %error, "durable storage still failing");
        } else {
            warn!(
                op,
                key,
                error = %error,
                "durable storage failed, keeping client state in memory for this session"
            );
            self.degraded = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Cookie mirror
// ---------------------------------------------------------------------------

/// Writes the anonymous token into the cookie jar the HTTP client sends.
#[derive(Debug, Clone)]
pub struct CookieMirror {
    jar: Arc<Jar>,
    url: reqwest::Url,
}

impl CookieMirror {
    /// Mirror into `jar` for requests to `url`.
    pub const fn new(jar: Arc<Jar>, url: reqwest::Url) -> Self {
        Self { jar, url }
    }

    /// Set the long-lived anonymous-id cookie.
    pub fn mirror_anon_id(&self, token: &str) {
        if token.is_empty() {
            return;
        }
        let cookie = format!(
            "{ANON_COOKIE_NAME}={token}; Path=/; Max-Age={ANON_COOKIE_MAX_AGE_SECS}"
        );
        self.jar.add_cookie_str(&cookie, &self.url);
    }
}
