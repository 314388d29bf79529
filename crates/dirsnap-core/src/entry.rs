//! The directory entry tree and its commit algorithm.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::compare::LogicalComparer;
use crate::error::ScanError;
use crate::size::display_size;
use crate::sorted::insert_sorted;

/// Diff outcome for a directory relative to the last committed snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryState {
    /// Size matches the last snapshot.
    #[default]
    Unchanged,
    /// Size differs from the last snapshot.
    Changed,
    /// First seen during the most recent refresh.
    Added,
    /// Present in the snapshot but gone from disk.
    Deleted,
}

/// Direction a directory's size moved since the last snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeChange {
    Same,
    Smaller,
    Larger,
}

/// One directory in the snapshot tree: the root or any descendant.
///
/// Children are exclusively owned, kept sorted under [`LogicalComparer`]
/// ordering, and unique by name without regard to case. `current_size` is
/// always the directory's direct file bytes plus the sum of its children's
/// `current_size` after a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// The directory's own name, not its full path.
    pub name: CompactString,

    /// Outcome of the most recent refresh.
    #[serde(default)]
    pub state: DirectoryState,

    /// Total bytes recorded at the last snapshot (0 if never committed).
    #[serde(default)]
    pub previous_size: u64,

    /// Total bytes as of the most recent refresh.
    #[serde(default)]
    pub current_size: u64,

    /// Subdirectory entries, sorted by name.
    #[serde(default)]
    pub children: Vec<DirectoryEntry>,
}

impl DirectoryEntry {
    /// Create an entry with no history.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            state: DirectoryState::Unchanged,
            previous_size: 0,
            current_size: 0,
            children: Vec::new(),
        }
    }

    /// Entry for a subdirectory first seen during the current refresh.
    pub fn added(name: impl Into<CompactString>) -> Self {
        Self {
            state: DirectoryState::Added,
            ..Self::new(name)
        }
    }

    /// Signed size movement since the last snapshot.
    pub fn size_delta(&self) -> i64 {
        self.current_size as i64 - self.previous_size as i64
    }

    /// Direction of the size movement. Equal sizes are [`SizeChange::Same`].
    pub fn size_change(&self) -> SizeChange {
        match self.previous_size.cmp(&self.current_size) {
            Ordering::Greater => SizeChange::Smaller,
            Ordering::Less => SizeChange::Larger,
            Ordering::Equal => SizeChange::Same,
        }
    }

    /// Current size as a display string.
    pub fn current_size_string(&self) -> String {
        display_size(self.current_size as i64)
    }

    /// Signed size delta as a display string.
    pub fn delta_string(&self) -> String {
        display_size(self.size_delta())
    }

    /// Case-insensitive sibling lookup used by the merge.
    pub fn has_child_named(&self, name: &str) -> bool {
        self.children
            .iter()
            .any(|c| eq_ignore_case(c.name.as_str(), name))
    }

    /// Re-sort children under the comparer. Needed after deserialization,
    /// where stored order is not trusted.
    pub fn sort_children(&mut self, comparer: &LogicalComparer) {
        self.children
            .sort_by(|a, b| comparer.compare(&a.name, &b.name));
    }

    /// Place a child at its sorted position without re-sorting the rest.
    pub fn insert_child_sorted(&mut self, child: DirectoryEntry, comparer: &LogicalComparer) {
        insert_sorted(&mut self.children, child, |a, b| {
            comparer.compare(&a.name, &b.name)
        });
    }

    /// Commit the current scan as the new baseline.
    ///
    /// Prunes direct children in the Deleted state, then recurses into the
    /// survivors, then resets this entry itself. Pruning must see each
    /// child's own state before recursing into it, so the order is fixed
    /// per node. Idempotent: a second call with no refresh in between
    /// changes nothing.
    pub fn snapshot(&mut self) {
        self.children.retain(|c| c.state != DirectoryState::Deleted);
        for child in &mut self.children {
            child.snapshot();
        }
        self.state = DirectoryState::Unchanged;
        self.previous_size = self.current_size;
    }

    /// Check the unique-sibling-names invariant over the whole subtree.
    ///
    /// A tree with duplicate sibling names (even differing only by case)
    /// would corrupt the merge's sorted insertion, so it is rejected rather
    /// than repaired.
    pub fn validate(&self) -> Result<(), ScanError> {
        self.validate_at(Path::new(self.name.as_str()))
    }

    fn validate_at(&self, path: &Path) -> Result<(), ScanError> {
        let mut seen: HashSet<String> = HashSet::with_capacity(self.children.len());
        for child in &self.children {
            if !seen.insert(fold_name(child.name.as_str())) {
                return Err(ScanError::DuplicateName {
                    parent: path.to_path_buf(),
                    name: child.name.to_string(),
                });
            }
        }
        for child in &self.children {
            child.validate_at(&path.join(child.name.as_str()))?;
        }
        Ok(())
    }

    /// Total number of entries in this subtree, itself included.
    pub fn entry_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(DirectoryEntry::entry_count)
            .sum::<usize>()
    }

    /// Full path of this entry under `parent_path`.
    pub fn path_under(&self, parent_path: &Path) -> PathBuf {
        parent_path.join(self.name.as_str())
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

fn fold_name(name: &str) -> String {
    name.chars().flat_map(char::to_lowercase).collect()
}
