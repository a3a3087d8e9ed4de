//! Legacy ledger integration tests
//! Exercise the registry through its public API over both storage backends

use legacy_node::{
    ErrorKind, EventLog, FileStorage, Hash, LedgerError, LegacyEvent, LegacyRegistry,
    MemoryStorage, NodeConfig, Storage, StorageError,
};
use std::sync::{Arc, Mutex};

#[test]
fn test_create_unlock_walkthrough() {
    let mut registry = LegacyRegistry::new(MemoryStorage::new());

    let key = registry.create(1, "QmTest123", "Test rules").unwrap();
    assert!(!registry.get(&key).unwrap().unlocked);

    registry.unlock(&key).unwrap();
    assert!(registry.get(&key).unwrap().unlocked);

    let err = registry.unlock(&key).unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyUnlocked(k) if k == key));
    assert!(err.to_string().contains("already"));
}

#[test]
fn test_unknown_key_is_not_found() {
    let registry = LegacyRegistry::new(MemoryStorage::new());
    let key: Hash = "0x0000000000000000000000000000000000000000000000000000000000000001"
        .parse()
        .unwrap();

    let err = registry.get(&key).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_same_content_different_owners_coexist() {
    let mut registry = LegacyRegistry::new(MemoryStorage::new());
    let first = registry.create(1, "QmShared", "a").unwrap();
    let second = registry.create(2, "QmShared", "b").unwrap();

    assert_ne!(first, second);
    registry.unlock(&first).unwrap();
    assert!(!registry.get(&second).unwrap().unlocked);
}

#[test]
fn test_listeners_receive_notifications() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let mut events = EventLog::new();
    let sink = Arc::clone(&received);
    events.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    let mut registry = LegacyRegistry::with_events(MemoryStorage::new(), events);
    let key = registry.create(7, "QmNotify", "after death").unwrap();
    registry.unlock(&key).unwrap();

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(
        received[0],
        LegacyEvent::Created {
            key,
            owner_id: 7,
            content_ref: "QmNotify".to_string(),
            rules: "after death".to_string(),
        }
    );
    assert_eq!(received[1], LegacyEvent::Unlocked { key, owner_id: 7 });
}

#[test]
fn test_file_storage_persists_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let config = NodeConfig {
        data_dir: dir.path().to_path_buf(),
        ..NodeConfig::default()
    };

    // Phase 1: create and unlock, then flush
    let (locked, unlocked) = {
        let mut registry = LegacyRegistry::new(FileStorage::open(config.snapshot_path()).unwrap());
        let locked = registry.create(1, "QmLocked", "keep").unwrap();
        let unlocked = registry.create(1, "QmOpen", "release").unwrap();
        registry.unlock(&unlocked).unwrap();
        registry.storage_mut().flush().unwrap();
        (locked, unlocked)
    };

    // Phase 2: reopen and verify the guard still holds
    let mut registry = LegacyRegistry::new(FileStorage::open(config.snapshot_path()).unwrap());
    assert!(!registry.get(&locked).unwrap().unlocked);
    assert!(registry.get(&unlocked).unwrap().unlocked);
    assert!(registry.unlock(&unlocked).unwrap_err().is_conflict());
    assert!(registry.create(1, "QmLocked", "again").unwrap_err().is_conflict());
    assert_eq!(registry.legacies_of(1).unwrap().len(), 2);
    assert!(registry.events().is_empty());
}

#[test]
fn test_open_ledger_refuses_second_writer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy_state.json");

    let mut first = LegacyRegistry::new(FileStorage::open(&path).unwrap());
    let key = first.create(2, "QmFirst", "").unwrap();
    assert!(matches!(
        FileStorage::open(&path).unwrap_err(),
        StorageError::Locked(_)
    ));

    first.unlock(&key).unwrap();
    first.storage_mut().flush().unwrap();
    drop(first);

    // The next writer sees the earlier unlock and cannot repeat it
    let mut second = LegacyRegistry::new(FileStorage::open(&path).unwrap());
    assert!(second.unlock(&key).unwrap_err().is_conflict());
    second.create(3, "QmSecond", "").unwrap();
    second.storage_mut().flush().unwrap();
    drop(second);

    let reopened = LegacyRegistry::new(FileStorage::open(&path).unwrap());
    assert_eq!(reopened.record_count().unwrap(), 2);
}

#[test]
fn test_registry_over_boxed_storage() {
    let storage: Box<dyn Storage> = Box::new(MemoryStorage::new());
    let mut registry = LegacyRegistry::new(storage);
    let key = registry.create(3, "QmBoxed", "").unwrap();

    assert!(registry.contains(&key).unwrap());
    assert_eq!(registry.storage().get_stats().unwrap().num_entries, 1);
}
