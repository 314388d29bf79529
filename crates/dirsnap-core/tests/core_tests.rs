use std::cmp::Ordering;

use dirsnap_core::{
    DirectoryEntry, DirectoryState, DirectoryStructure, LogicalComparer, RefreshConfig,
    display_size, insert_sorted,
};

fn entry(name: &str, state: DirectoryState, previous: u64, current: u64) -> DirectoryEntry {
    DirectoryEntry {
        state,
        previous_size: previous,
        current_size: current,
        ..DirectoryEntry::new(name)
    }
}

#[test]
fn test_logical_ordering_of_numeric_suffixes() {
    let comparer = LogicalComparer::default();

    assert_eq!(comparer.compare("Foo-2", "Foo-10"), Ordering::Less);
    assert_eq!(comparer.compare("Foo-10", "Foo-100"), Ordering::Less);
    assert_eq!(comparer.compare("foo", "Foo"), Ordering::Less);
}

#[test]
fn test_insert_sorted_with_logical_comparer() {
    let comparer = LogicalComparer::default();
    let mut names: Vec<String> = ["Backup-1", "Backup-10", "alpha"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    insert_sorted(&mut names, "Backup-3".to_string(), |a, b| {
        comparer.compare(a, b)
    });

    assert_eq!(names, ["Backup-1", "Backup-3", "Backup-10", "alpha"]);
}

#[test]
fn test_snapshot_idempotence_over_full_structure() {
    let mut structure = DirectoryStructure::new("data", "/srv/data");
    structure.root = entry("/srv/data", DirectoryState::Changed, 100, 1500);
    structure
        .root
        .children
        .push(entry("gone", DirectoryState::Deleted, 400, 0));
    structure
        .root
        .children
        .push(entry("grown", DirectoryState::Changed, 100, 1500));

    structure.snapshot();
    let committed = structure.clone();
    structure.snapshot();

    assert_eq!(structure, committed);
    assert_eq!(structure.root.children.len(), 1);
    assert_eq!(structure.root.state, DirectoryState::Unchanged);
    assert_eq!(structure.root.previous_size, 1500);
}

#[test]
fn test_no_deleted_entries_survive_a_commit() {
    let mut deep = entry("deep", DirectoryState::Changed, 0, 10);
    deep.children
        .push(entry("gone-inner", DirectoryState::Deleted, 5, 0));
    let mut root = entry("root", DirectoryState::Changed, 0, 10);
    root.children.push(deep);
    root.children
        .push(entry("gone-outer", DirectoryState::Deleted, 7, 0));

    root.snapshot();

    fn assert_committed(e: &DirectoryEntry) {
        assert_eq!(e.state, DirectoryState::Unchanged);
        assert_eq!(e.previous_size, e.current_size);
        for child in &e.children {
            assert_committed(child);
        }
    }
    assert_committed(&root);
    assert_eq!(root.children.len(), 1);
    assert!(root.children[0].children.is_empty());
}

#[test]
fn test_structure_serde_round_trip() {
    let mut structure = DirectoryStructure::new("C", "C:\\");
    structure.root.state = DirectoryState::Changed;
    structure.root.previous_size = 9000;
    structure.root.current_size = 10_500;
    structure
        .root
        .children
        .push(entry("Backup-1", DirectoryState::Unchanged, 500, 500));
    structure
        .root
        .children
        .push(entry("Backup-3", DirectoryState::Added, 0, 9000));
    structure
        .root
        .children
        .push(entry("Logs", DirectoryState::Deleted, 1000, 0));
    structure.last_scan_secs = 12.5;

    let json = serde_json::to_string_pretty(&structure).unwrap();
    let loaded: DirectoryStructure = serde_json::from_str(&json).unwrap();

    assert_eq!(loaded, structure);
    let names: Vec<&str> = loaded
        .root
        .children
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, ["Backup-1", "Backup-3", "Logs"]);
}

#[test]
fn test_deserializing_minimal_fields_fills_defaults() {
    let json = r#"{"drive":"C","root":{"name":"C:\\"}}"#;
    let structure: DirectoryStructure = serde_json::from_str(json).unwrap();

    assert_eq!(structure.root.state, DirectoryState::Unchanged);
    assert_eq!(structure.root.previous_size, 0);
    assert_eq!(structure.root.current_size, 0);
    assert!(structure.root.children.is_empty());
    assert_eq!(structure.last_scan_secs, 0.0);
    assert!(structure.scanned_at.is_none());
}

#[test]
fn test_display_formatting_examples() {
    assert_eq!(display_size(500), "500 b");
    assert_eq!(display_size(2048), "2 KB");
    assert_eq!(display_size(5_242_880), "5 MB");
}

#[test]
fn test_comparer_built_from_config_digits() {
    let config = RefreshConfig::default();
    let comparer = LogicalComparer::with_digits(&config.digits);
    assert_eq!(comparer.compare("part2", "part10"), Ordering::Less);
}
