/*!
 * Tests for snapshot storage backends and the snapshot store
 */

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

use bulk_translate::persistence::{
    FileStorage, KeyValueStorage, MemoryStorage, PersistedSnapshot, PersistenceStore,
};

use crate::common;

fn snapshot_with_failure() -> PersistedSnapshot {
    let mut failed = common::item(11, "fr");
    failed.error_message = Some("quota exceeded".to_string());
    PersistedSnapshot::capture(
        vec![common::item(12, "de")],
        vec![common::item(10, "es")],
        vec![failed],
        true,
        None,
    )
}

#[test]
fn test_file_store_save_then_load_shouldRestoreVerbatim() {
    let dir = common::create_temp_dir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
    let store = PersistenceStore::new(storage, "translation_queue", Duration::from_secs(3600));

    let snapshot = snapshot_with_failure();
    store.save(&snapshot);

    assert!(dir.path().join("translation_queue.json").exists());
    assert_eq!(store.load(), Some(snapshot));
}

#[test]
fn test_file_store_shouldSurviveReopening() {
    let dir = common::create_temp_dir().unwrap();
    let snapshot = snapshot_with_failure();
    {
        let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
        PersistenceStore::new(storage, "q", Duration::from_secs(3600)).save(&snapshot);
    }

    let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
    let reopened = PersistenceStore::new(storage, "q", Duration::from_secs(3600));
    assert_eq!(reopened.load(), Some(snapshot));
}

#[test]
fn test_store_load_withExpiredSnapshot_shouldReturnNone() {
    let store = common::memory_store();
    let snapshot = snapshot_with_failure();
    store.save(&snapshot);

    assert!(store.load_at(snapshot.saved_at + ChronoDuration::minutes(59)).is_some());
    assert!(store.load_at(snapshot.saved_at + ChronoDuration::minutes(61)).is_none());
}

#[test]
fn test_store_load_withCustomTtl_shouldHonourIt() {
    let store = PersistenceStore::new(
        Arc::new(MemoryStorage::new()),
        "short",
        Duration::from_secs(10),
    );
    let snapshot = snapshot_with_failure();
    store.save(&snapshot);

    assert!(store.load_at(snapshot.saved_at + ChronoDuration::seconds(10)).is_some());
    assert!(store.load_at(snapshot.saved_at + ChronoDuration::seconds(11)).is_none());
}

#[test]
fn test_store_load_withFutureTimestamp_shouldNotTreatAsStale() {
    let store = common::memory_store();
    let mut snapshot = snapshot_with_failure();
    snapshot.saved_at = Utc::now() + ChronoDuration::minutes(5);
    store.save(&snapshot);

    assert_eq!(store.load(), Some(snapshot));
}

#[test]
fn test_store_save_withFailingStorage_shouldSwallowError() {
    let store = PersistenceStore::new(
        Arc::new(MemoryStorage::with_quota(16)),
        "queue",
        Duration::from_secs(3600),
    );
    store.save(&snapshot_with_failure());
    store.clear();
    assert_eq!(store.load(), None);
}

#[test]
fn test_store_load_withForeignJson_shouldReturnNone() {
    let storage = Arc::new(MemoryStorage::new());
    storage.insert_raw("queue", r#"{"hello": "world"}"#);
    let store = PersistenceStore::new(storage, "queue", Duration::from_secs(3600));
    assert_eq!(store.load(), None);
}

#[test]
fn test_snapshot_json_shouldOmitAbsentInterruptedItem() {
    let json = serde_json::to_value(snapshot_with_failure()).unwrap();
    assert!(json.get("interrupted").is_none());
    assert_eq!(json["failed"][0]["error_message"], "quota exceeded");
    assert_eq!(json["paused"], true);
}

#[test]
fn test_file_storage_remove_withMissingKey_shouldSucceed() {
    let dir = common::create_temp_dir().unwrap();
    let storage = FileStorage::new(dir.path()).unwrap();
    assert!(storage.remove("never_written").is_ok());
    assert_eq!(storage.get("never_written").unwrap(), None);
}
