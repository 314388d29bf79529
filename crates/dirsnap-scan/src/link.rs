//! Link-directory detection.

use std::fs;
use std::path::Path;

/// True when `path` is a symbolic link rather than a real directory.
///
/// The refresh never traverses or adds link directories, which prevents
/// cycles and double-counting. When the check itself fails the answer is
/// `false`: without the capability the path is treated as a real directory.
pub fn is_link_dir(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}
