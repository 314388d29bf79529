//! Error types for snapshot persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur reading or writing persisted snapshots.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No application data directory available on this platform.
    #[error("No application data directory available")]
    NoDataDir,

    /// Drive keys become file names, so path-like keys are rejected.
    #[error("Invalid drive key {drive:?}")]
    InvalidDrive { drive: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file exists but is not valid JSON for a structure.
    #[error("Malformed snapshot {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot parsed but violates tree invariants.
    #[error("Rejected snapshot {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: dirsnap_core::ScanError,
    },
}
