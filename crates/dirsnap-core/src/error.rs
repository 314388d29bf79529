//! Error and warning types for refresh operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can abort a refresh or reject a loaded tree.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Sibling names must be unique without regard to case; a tree that
    /// violates this would corrupt sorted insertion during a merge.
    #[error("duplicate sibling directory name {name:?} under {parent}")]
    DuplicateName { parent: PathBuf, name: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Not-found and access-denied are the only kinds a refresh absorbs when
    /// a freshly discovered subdirectory fails; everything else propagates.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::NotFound { .. })
    }
}

/// Kind of refresh warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied listing a directory's contents.
    PermissionDenied,
    /// A freshly discovered subdirectory could not be scanned and was
    /// excluded from this refresh.
    SkippedSubdir,
    /// A file's metadata could not be read; its size is not counted.
    MetadataError,
}

/// Non-fatal warning recorded during a refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a permission denied warning.
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Permission denied: {}", path.display()),
            path,
            kind: WarningKind::PermissionDenied,
        }
    }

    /// Create a skipped-subdirectory warning.
    pub fn skipped_subdir(path: impl Into<PathBuf>, error: &ScanError) -> Self {
        let path = path.into();
        Self {
            message: format!("Skipped: {error}"),
            path,
            kind: WarningKind::SkippedSubdir,
        }
    }

    /// Create a metadata error warning.
    pub fn metadata_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        Self {
            message: format!("Metadata error: {error}"),
            path,
            kind: WarningKind::MetadataError,
        }
    }
}
