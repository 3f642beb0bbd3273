//! Durable collection of submitted student records.
//!
//! The whole collection lives as one JSON value under [`STORAGE_KEY`] in a
//! key-value [`StorageBackend`]. Every mutation is a read-modify-write of that
//! value, serialized by a mutex inside [`LocalRecordStore`].

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::record::StudentRecord;

/// Key the record collection is stored under.
pub const STORAGE_KEY: &str = "unity_saved_id_cards";

const STORE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
}

/// Minimal string key-value store, the shape of browser local storage.
pub trait StorageBackend: Send + Sync {
    /// Returns `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Replace the value under `key` in one step.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Keeps each key as `<dir>/<key>.json`, replaced atomically on write.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let io_err = |source| StorageError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(value.as_bytes()).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(&path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}

/// Process-local backend for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing the record store (legacy or tampered data).
    pub fn with_raw(key: &str, value: impl Into<String>) -> Self {
        let backend = Self::new();
        lock(&backend.entries).insert(key.to_string(), value.into());
        backend
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Durable mapping from roll number to the latest record submitted for it.
///
/// None of the operations fail visibly: storage problems are logged and the
/// caller carries on with its primary workflow.
pub trait RecordStore {
    /// Every persisted record in stored order; empty when nothing usable is stored.
    fn list(&self) -> Vec<StudentRecord>;
    /// Replace the record with the same roll number in place, or append.
    fn upsert(&self, record: StudentRecord);
    /// Remove records matching both roll number and creation time.
    fn delete(&self, roll_number: &str, created_at: &str);

    fn find(&self, roll_number: &str) -> Option<StudentRecord> {
        self.list()
            .into_iter()
            .find(|r| r.roll_number == roll_number)
    }
}

/// Versioned envelope written by this crate.
#[derive(Serialize)]
struct Envelope<'a> {
    version: u32,
    records: &'a [StudentRecord],
}

/// Accepted persisted shapes, including the unversioned legacy array.
#[derive(Deserialize)]
#[serde(untagged)]
enum Persisted {
    Versioned {
        version: u32,
        records: Vec<StudentRecord>,
    },
    Legacy(Vec<StudentRecord>),
}

/// [`RecordStore`] over any [`StorageBackend`].
#[derive(Debug)]
pub struct LocalRecordStore<B> {
    backend: B,
    write_lock: Mutex<()>,
}

pub type FileRecordStore = LocalRecordStore<FileBackend>;
pub type MemoryRecordStore = LocalRecordStore<MemoryBackend>;

impl<B: StorageBackend> LocalRecordStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn load(&self) -> Vec<StudentRecord> {
        let raw = match self.backend.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "error retrieving saved cards");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Persisted>(&raw) {
            Ok(Persisted::Versioned { version, records }) => {
                if version > STORE_VERSION {
                    warn!(version, "saved cards written by a newer version; reading anyway");
                }
                records
            }
            Ok(Persisted::Legacy(records)) => {
                debug!(count = records.len(), "read legacy unversioned saved cards");
                records
            }
            Err(err) => {
                warn!(error = %err, "saved cards are malformed; treating as empty");
                Vec::new()
            }
        }
    }

    fn store(&self, records: &[StudentRecord]) -> Result<(), StorageError> {
        let payload = serde_json::to_string(&Envelope {
            version: STORE_VERSION,
            records,
        })?;
        self.backend.set(STORAGE_KEY, &payload)
    }
}

impl<B: StorageBackend> RecordStore for LocalRecordStore<B> {
    fn list(&self) -> Vec<StudentRecord> {
        self.load()
    }

    fn upsert(&self, record: StudentRecord) {
        let _guard = lock(&self.write_lock);
        let mut records = self.load();
        let roll = record.roll_number.clone();
        match records.iter().position(|r| r.roll_number == roll) {
            Some(idx) => records[idx] = record,
            None => records.push(record),
        }
        match self.store(&records) {
            Ok(()) => info!(roll_number = %roll, total = records.len(), "saved card"),
            Err(err) => warn!(roll_number = %roll, error = %err, "error saving card"),
        }
    }

    fn delete(&self, roll_number: &str, created_at: &str) {
        let _guard = lock(&self.write_lock);
        let mut records = self.load();
        let before = records.len();
        records.retain(|r| r.roll_number != roll_number || r.created_at != created_at);
        if records.len() == before {
            debug!(roll_number, created_at, "no saved card matched delete");
            return;
        }
        match self.store(&records) {
            Ok(()) => info!(roll_number, removed = before - records.len(), "deleted card"),
            Err(err) => warn!(roll_number, error = %err, "error deleting card"),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(roll: &str, name: &str) -> StudentRecord {
        StudentRecord {
            name: name.into(),
            roll_number: roll.into(),
            class_division: "Class 1-A".into(),
            allergies: Vec::new(),
            photo: None,
            rack_number: "R-1".into(),
            bus_route: "Route 1".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn writes_versioned_envelope() {
        let store = MemoryRecordStore::new(MemoryBackend::new());
        store.upsert(record("1", "A"));
        let raw = store.backend().raw(STORAGE_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["records"][0]["rollNumber"], "1");
    }

    #[test]
    fn reads_legacy_array() {
        let legacy = serde_json::to_string(&vec![record("1", "A"), record("2", "B")]).unwrap();
        let store = MemoryRecordStore::new(MemoryBackend::with_raw(STORAGE_KEY, legacy));
        let names: Vec<String> = store.list().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn malformed_payload_reads_as_empty() {
        for raw in ["{not json", "{\"cards\":1}", "42", "[{\"name\":1}]"] {
            let store = MemoryRecordStore::new(MemoryBackend::with_raw(STORAGE_KEY, raw));
            assert!(store.list().is_empty(), "payload {raw:?}");
        }
    }

    #[test]
    fn upsert_over_malformed_payload_starts_fresh() {
        let store = MemoryRecordStore::new(MemoryBackend::with_raw(STORAGE_KEY, "garbage"));
        store.upsert(record("1", "A"));
        assert_eq!(store.list(), vec![record("1", "A")]);
    }

    #[test]
    fn find_returns_current_record() {
        let store = MemoryRecordStore::new(MemoryBackend::new());
        store.upsert(record("1", "A"));
        assert_eq!(store.find("1").map(|r| r.name), Some("A".to_string()));
        assert_eq!(store.find("2"), None);
    }

    #[test]
    fn file_backend_round_trips_and_reports_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nested"));
        assert!(backend.get(STORAGE_KEY).unwrap().is_none());
        backend.set(STORAGE_KEY, "[]").unwrap();
        assert_eq!(backend.get(STORAGE_KEY).unwrap().as_deref(), Some("[]"));
        assert!(backend.path_for(STORAGE_KEY).ends_with("unity_saved_id_cards.json"));
    }
}
