// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Durable session storage.
//!
//! The session is persisted as a single JSON entry under a key. The file
//! store maps the key to `<dir>/<key>.json`; the memory store keeps the
//! serialized text so both exercise the same format.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::Session;

/// Default key for the persisted session
pub const SESSION_KEY: &str = "song-presenter-session";

/// Storage failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session storage I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize session: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Stored session is not valid: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Key-value persistence for one session
pub trait SessionStore: Send {
    /// Load the persisted session, `Ok(None)` when nothing is stored
    fn load(&self) -> Result<Option<Session>, StoreError>;

    /// Persist the session, replacing any previous value
    fn save(&mut self, session: &Session) -> Result<(), StoreError>;

    /// Remove the persisted session
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Serialize a session to its durable JSON form
pub fn to_json(session: &Session) -> Result<String, StoreError> {
    serde_json::to_string(session).map_err(StoreError::Serialize)
}

/// Parse a session from its durable JSON form
///
/// Only a JSON object is a session; arrays and scalars are rejected even
/// though every field has a default.
pub fn from_json(json: &str) -> Result<Session, StoreError> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(StoreError::Deserialize)?;
    if !value.is_object() {
        return Err(StoreError::Deserialize(serde::de::Error::custom(
            "expected a session object",
        )));
    }
    serde_json::from_value(value).map_err(StoreError::Deserialize)
}

/// Directory-backed store, one file per key
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store for `key` inside `dir`
    pub fn new<P: AsRef<Path>>(dir: P, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", key)),
        }
    }

    /// Path of the session file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(json) if json.trim().is_empty() => Ok(None),
            Ok(json) => from_json(&json).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&mut self, session: &Session) -> Result<(), StoreError> {
        let json = to_json(session)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        // Write then rename so watchers never see a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-memory store; clones share the same entry
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entry: Arc<Mutex<Option<String>>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored JSON, if any
    pub fn raw(&self) -> Option<String> {
        self.entry.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Overwrite the raw stored text
    pub fn set_raw(&self, json: impl Into<String>) {
        *self.entry.lock().unwrap_or_else(|e| e.into_inner()) = Some(json.into());
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        self.raw().map(|json| from_json(&json)).transpose()
    }

    fn save(&mut self, session: &Session) -> Result<(), StoreError> {
        let json = to_json(session)?;
        self.set_raw(json);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        *self.entry.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::parse;
    use tempfile::tempdir;

    fn sample() -> Session {
        Session {
            songs: vec![parse("# Stored\n## Chorus\nHey", "s1")],
            current_song_id: Some("s1".to_string()),
            current_part_index: 0,
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = FileSessionStore::new(dir.path(), SESSION_KEY);

        assert!(store.load().unwrap().is_none());

        store.save(&sample()).unwrap();
        assert!(store.path().ends_with("song-presenter-session.json"));
        assert_eq!(store.load().unwrap(), Some(sample()));
    }

    #[test]
    fn test_file_store_creates_directory() {
        let dir = tempdir().unwrap();
        let mut store = FileSessionStore::new(dir.path().join("nested/store"), "k");
        store.save(&Session::new()).unwrap();
        assert_eq!(store.load().unwrap(), Some(Session::new()));
    }

    #[test]
    fn test_file_store_clear() {
        let dir = tempdir().unwrap();
        let mut store = FileSessionStore::new(dir.path(), "k");
        store.save(&sample()).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_corrupt_entry() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path(), "k");
        fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Deserialize(_))));
    }

    #[test]
    fn test_memory_store_shared_between_clones() {
        let mut store = MemorySessionStore::new();
        let other = store.clone();
        store.save(&sample()).unwrap();
        assert_eq!(other.load().unwrap(), Some(sample()));

        store.clear().unwrap();
        assert!(other.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_store_corrupt_entry() {
        let store = MemorySessionStore::new();
        store.set_raw("{\"songs\": ");
        assert!(matches!(store.load(), Err(StoreError::Deserialize(_))));
    }

    #[test]
    fn test_non_object_session_rejected() {
        for raw in ["[]", "[[], null, 0]", "null", "3", "\"session\""] {
            assert!(
                matches!(from_json(raw), Err(StoreError::Deserialize(_))),
                "accepted {}",
                raw
            );
        }
        assert_eq!(from_json("{}").unwrap(), Session::new());
    }
}
