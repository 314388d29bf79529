//! Root aggregate binding a volume to its entry tree.

use std::time::Duration;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::entry::DirectoryEntry;
use crate::error::ScanError;

/// A volume's snapshot tree plus scan diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryStructure {
    /// Volume or label identifier; keys the persisted snapshot file.
    pub drive: String,

    /// Root of the entry tree. Its name is the root directory path, so a
    /// refresh starting from an empty parent path resolves it directly.
    pub root: DirectoryEntry,

    /// Wall-clock seconds the last refresh took. Diagnostic only.
    #[serde(default)]
    pub last_scan_secs: f64,

    /// When the last refresh finished.
    #[serde(default)]
    pub scanned_at: Option<DateTime<Utc>>,
}

impl DirectoryStructure {
    /// Fresh structure for a drive with no prior snapshot: every size zero,
    /// every state Unchanged.
    pub fn new(drive: impl Into<String>, root_directory: impl Into<CompactString>) -> Self {
        Self {
            drive: drive.into(),
            root: DirectoryEntry::new(root_directory),
            last_scan_secs: 0.0,
            scanned_at: None,
        }
    }

    /// Commit the current scan as the new baseline.
    pub fn snapshot(&mut self) {
        self.root.snapshot();
    }

    /// Record refresh timing diagnostics.
    pub fn mark_scanned(&mut self, duration: Duration) {
        self.last_scan_secs = duration.as_secs_f64();
        self.scanned_at = Some(Utc::now());
    }

    /// Check structural invariants of the whole tree.
    pub fn validate(&self) -> Result<(), ScanError> {
        self.root.validate()
    }
}
