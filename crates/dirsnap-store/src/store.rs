//! The on-disk snapshot store: one file per drive key.

use std::fs;
use std::path::{Path, PathBuf};

use dirsnap_core::DirectoryStructure;

use crate::error::StoreError;

/// File extension for persisted snapshots.
const SNAPSHOT_EXT: &str = "snapshot";

/// Persists one [`DirectoryStructure`] per drive key as pretty-printed
/// JSON under an application-data directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Store rooted at the platform application-data directory
    /// (`<data_dir>/dirsnap`).
    pub fn open() -> Result<Self, StoreError> {
        let base = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
        Ok(Self {
            dir: base.join("dirsnap"),
        })
    }

    /// Store rooted at an explicit directory (tests, portable setups).
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory this store reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file for a drive key.
    pub fn path_for(&self, drive: &str) -> Result<PathBuf, StoreError> {
        validate_drive(drive)?;
        Ok(self.dir.join(format!("{drive}.{SNAPSHOT_EXT}")))
    }

    /// Load the snapshot for `drive`. `Ok(None)` when none has been saved.
    ///
    /// A file that fails to parse, or whose tree violates the
    /// unique-sibling-names invariant, is an error at this level;
    /// [`SnapshotStore::load_or_fresh`] is the recovering variant.
    pub fn load(&self, drive: &str) -> Result<Option<DirectoryStructure>, StoreError> {
        let path = self.path_for(drive)?;
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Io { path, source: err }),
        };
        let structure: DirectoryStructure = serde_json::from_str(&data).map_err(|source| {
            StoreError::Malformed {
                path: path.clone(),
                source,
            }
        })?;
        structure
            .validate()
            .map_err(|source| StoreError::Corrupt { path, source })?;
        Ok(Some(structure))
    }

    /// Load the drive's snapshot, falling back to a fresh structure (all
    /// sizes zero) when none exists or the stored one cannot be used.
    pub fn load_or_fresh(&self, drive: &str, root_directory: &str) -> DirectoryStructure {
        match self.load(drive) {
            Ok(Some(structure)) => structure,
            Ok(None) => DirectoryStructure::new(drive, root_directory),
            Err(err) => {
                tracing::warn!(drive, error = %err, "discarding unusable snapshot");
                DirectoryStructure::new(drive, root_directory)
            }
        }
    }

    /// Persist the structure under its own drive key, creating the store
    /// directory on demand.
    pub fn save(&self, structure: &DirectoryStructure) -> Result<(), StoreError> {
        let path = self.path_for(&structure.drive)?;
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(structure).map_err(|source| {
            StoreError::Malformed {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, json).map_err(|source| StoreError::Io { path, source })?;
        Ok(())
    }

    /// Drive keys that currently have a stored snapshot, sorted.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let reader = match fs::read_dir(&self.dir) {
            Ok(reader) => reader,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source: err,
                });
            }
        };
        let mut drives = Vec::new();
        for entry in reader.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == SNAPSHOT_EXT) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    drives.push(stem.to_string());
                }
            }
        }
        drives.sort();
        Ok(drives)
    }
}

/// Drive keys become file names; anything path-like is rejected.
fn validate_drive(drive: &str) -> Result<(), StoreError> {
    if drive.is_empty() || drive == "." || drive == ".." || drive.contains(['/', '\\']) {
        return Err(StoreError::InvalidDrive {
            drive: drive.to_string(),
        });
    }
    Ok(())
}
