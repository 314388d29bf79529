use std::fs;

use tempfile::TempDir;

use dirsnap_core::{DirectoryEntry, DirectoryState, DirectoryStructure};
use dirsnap_store::{SnapshotStore, StoreError};

fn sample_structure() -> DirectoryStructure {
    let mut structure = DirectoryStructure::new("C", "C:\\");
    structure.root.state = DirectoryState::Changed;
    structure.root.previous_size = 1000;
    structure.root.current_size = 1500;
    structure.root.children.push(DirectoryEntry {
        state: DirectoryState::Unchanged,
        previous_size: 400,
        current_size: 400,
        ..DirectoryEntry::new("Backup-1")
    });
    structure.root.children.push(DirectoryEntry {
        state: DirectoryState::Added,
        previous_size: 0,
        current_size: 1100,
        ..DirectoryEntry::new("Backup-3")
    });
    structure.last_scan_secs = 3.25;
    structure
}

#[test]
fn test_save_then_load_reproduces_identical_tree() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::with_dir(temp.path());
    let structure = sample_structure();

    store.save(&structure).unwrap();
    let loaded = store.load("C").unwrap().expect("snapshot should exist");

    assert_eq!(loaded, structure);
    let names: Vec<&str> = loaded
        .root
        .children
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, ["Backup-1", "Backup-3"]);
}

#[test]
fn test_load_or_fresh_without_snapshot() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::with_dir(temp.path());

    let structure = store.load_or_fresh("D", "D:\\");

    assert_eq!(structure.drive, "D");
    assert_eq!(structure.root.name.as_str(), "D:\\");
    assert_eq!(structure.root.previous_size, 0);
    assert_eq!(structure.root.current_size, 0);
}

#[test]
fn test_malformed_snapshot_is_an_error_then_recovers() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::with_dir(temp.path());
    fs::write(temp.path().join("C.snapshot"), "{ not json").unwrap();

    assert!(matches!(store.load("C"), Err(StoreError::Malformed { .. })));

    let fresh = store.load_or_fresh("C", "C:\\");
    assert_eq!(fresh.root.current_size, 0);
}

#[test]
fn test_duplicate_sibling_snapshot_is_rejected() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::with_dir(temp.path());

    let mut corrupt = DirectoryStructure::new("C", "C:\\");
    corrupt.root.children.push(DirectoryEntry::new("Logs"));
    corrupt.root.children.push(DirectoryEntry::new("logs"));
    // Write it raw; save() would happily serialize it.
    fs::write(
        temp.path().join("C.snapshot"),
        serde_json::to_string(&corrupt).unwrap(),
    )
    .unwrap();

    assert!(matches!(store.load("C"), Err(StoreError::Corrupt { .. })));

    let fresh = store.load_or_fresh("C", "C:\\");
    assert!(fresh.root.children.is_empty());
}

#[test]
fn test_save_overwrites_previous_snapshot() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::with_dir(temp.path());

    let mut structure = sample_structure();
    store.save(&structure).unwrap();

    structure.snapshot();
    store.save(&structure).unwrap();

    let loaded = store.load("C").unwrap().unwrap();
    assert_eq!(loaded.root.state, DirectoryState::Unchanged);
    assert_eq!(loaded.root.previous_size, 1500);
}

#[test]
fn test_list_returns_sorted_drive_keys() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::with_dir(temp.path());

    for drive in ["zeta", "C", "alpha"] {
        store
            .save(&DirectoryStructure::new(drive, "/"))
            .unwrap();
    }
    // Unrelated files are ignored.
    fs::write(temp.path().join("notes.txt"), "hi").unwrap();

    assert_eq!(store.list().unwrap(), ["C", "alpha", "zeta"]);
}
