use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use unity_id::{
    FileBackend, FileRecordStore, LocalRecordStore, MemoryBackend, MemoryRecordStore,
    RecordStore, STORAGE_KEY, StorageBackend, StorageError, StudentRecord,
};

fn record(roll: &str, name: &str, created_at: &str) -> StudentRecord {
    StudentRecord {
        name: name.to_string(),
        roll_number: roll.to_string(),
        class_division: "Class 2-B".to_string(),
        allergies: Vec::new(),
        photo: None,
        rack_number: "R-7".to_string(),
        bus_route: "Route 3".to_string(),
        created_at: created_at.to_string(),
    }
}

fn memory_store() -> MemoryRecordStore {
    LocalRecordStore::new(MemoryBackend::new())
}

struct ReadOnlyBackend;

impl StorageBackend for ReadOnlyBackend {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }
}

#[test]
fn empty_store_lists_nothing() {
    assert!(memory_store().list().is_empty());

    let dir = tempfile::tempdir().unwrap();
    let store = FileRecordStore::new(FileBackend::new(dir.path().join("never-created")));
    assert!(store.list().is_empty());
}

#[test]
fn upsert_same_roll_keeps_one_record_with_latest_fields() {
    let store = memory_store();
    store.upsert(record("R1", "First", "2024-01-01T00:00:00Z"));
    let mut updated = record("R1", "First", "2024-01-01T00:00:00Z");
    updated.bus_route = "Route 5".to_string();
    store.upsert(updated.clone());

    assert_eq!(store.list(), vec![updated]);
}

#[test]
fn update_keeps_relative_position() {
    let store = memory_store();
    store.upsert(record("A", "Alpha", "t1"));
    store.upsert(record("B", "Bravo", "t2"));
    store.upsert(record("C", "Charlie", "t3"));
    store.upsert(record("B", "Bravo Updated", "t4"));

    let listed: Vec<(String, String)> = store
        .list()
        .into_iter()
        .map(|r| (r.roll_number, r.name))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("A".to_string(), "Alpha".to_string()),
            ("B".to_string(), "Bravo Updated".to_string()),
            ("C".to_string(), "Charlie".to_string()),
        ]
    );
}

#[test]
fn delete_matches_roll_and_creation_time() {
    // Two entries under one roll number can only come from outside the store.
    let tampered = serde_json::to_string(&vec![
        record("R", "Old", "2023-01-01T00:00:00Z"),
        record("R", "New", "2024-01-01T00:00:00Z"),
        record("S", "Other", "2023-01-01T00:00:00Z"),
    ])
    .unwrap();
    let store = LocalRecordStore::new(MemoryBackend::with_raw(STORAGE_KEY, tampered));

    store.delete("R", "2023-01-01T00:00:00Z");

    let names: Vec<String> = store.list().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["New".to_string(), "Other".to_string()]);
}

#[test]
fn delete_without_match_is_a_no_op() {
    let store = memory_store();
    store.upsert(record("R", "Only", "2024-01-01T00:00:00Z"));
    let before = store.list();

    store.delete("R", "1999-01-01T00:00:00Z");
    store.delete("missing", "2024-01-01T00:00:00Z");

    assert_eq!(store.list(), before);
}

#[test]
fn overwritten_record_is_deleted_by_its_current_creation_time() {
    let store = memory_store();
    store.upsert(record("R", "First", "2024-01-01T00:00:00Z"));
    store.upsert(record("R", "Second", "2024-02-01T00:00:00Z"));

    store.delete("R", "2024-01-01T00:00:00Z");
    assert_eq!(store.list().len(), 1);

    let current = store.find("R").unwrap();
    store.delete("R", &current.created_at);
    assert!(store.list().is_empty());
}

#[test]
fn write_failures_are_swallowed() {
    let store = LocalRecordStore::new(ReadOnlyBackend);
    store.upsert(record("R", "Lost", "t"));
    store.delete("R", "t");
    assert!(store.list().is_empty());
}

#[test]
fn store_does_not_touch_created_at() {
    let store = memory_store();
    let rec = record("R", "Stamp", "not-even-a-date");
    store.upsert(rec.clone());
    assert_eq!(store.list()[0].created_at, "not-even-a-date");
}

#[test]
fn concurrent_upserts_do_not_lose_writes() {
    let store = Arc::new(memory_store());
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 0..10 {
                    let roll = format!("W{worker}-{n}");
                    store.upsert(record(&roll, "Student", "t"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.list().len(), 80);
}

#[test]
fn file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let first = FileRecordStore::new(FileBackend::new(dir.path()));
    first.upsert(record("R1", "Persisted", "2024-01-01T00:00:00Z"));
    drop(first);

    let second = FileRecordStore::new(FileBackend::new(dir.path()));
    assert_eq!(
        second.list(),
        vec![record("R1", "Persisted", "2024-01-01T00:00:00Z")]
    );
}

#[test]
fn file_store_reads_legacy_browser_export() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = r#"[{"name":"Jane Doe","rollNumber":"U2022001","classDivision":"Class 1-A","allergies":[],"photo":"","rackNumber":"R-42","busRoute":"Route 1","createdAt":"2024-01-01T00:00:00.000Z"}]"#;
    std::fs::write(dir.path().join(format!("{STORAGE_KEY}.json")), legacy).unwrap();

    let store = FileRecordStore::new(FileBackend::new(dir.path()));
    let records = store.list();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].photo, None);
    assert_eq!(records[0].roll_number, "U2022001");
}
