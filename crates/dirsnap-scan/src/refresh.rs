//! The scan+merge engine: reconciles the live filesystem into a snapshot tree.

use std::fs;
use std::path::Path;
use std::time::Instant;

use compact_str::CompactString;

use dirsnap_core::{
    DirectoryEntry, DirectoryState, DirectoryStructure, LogicalComparer, RefreshConfig, ScanError,
    ScanWarning,
};

use crate::link;
use crate::progress::RefreshReport;

/// Predicate deciding whether a path is a link/shortcut directory that must
/// not be traversed.
pub type LinkDetector = Box<dyn Fn(&Path) -> bool + Send + Sync>;

/// Merges a fresh filesystem walk into a previously persisted tree.
///
/// Matching children keep their identity and size history; vanished ones
/// are marked Deleted; subdirectories seen for the first time enter at
/// their sorted position with state Added. Sizes aggregate bottom-up as
/// the recursion unwinds, so after a refresh every entry's `current_size`
/// is its direct file bytes plus the sum of its children.
pub struct Refresher {
    config: RefreshConfig,
    comparer: LogicalComparer,
    is_link_dir: LinkDetector,
}

impl Refresher {
    /// Create a refresher with default configuration.
    pub fn new() -> Self {
        Self::with_config(RefreshConfig::default())
    }

    /// Create a refresher with the given configuration.
    pub fn with_config(config: RefreshConfig) -> Self {
        let comparer = LogicalComparer::with_digits(&config.digits);
        Self {
            config,
            comparer,
            is_link_dir: Box::new(link::is_link_dir),
        }
    }

    /// Replace the link predicate (platform integrations, tests).
    pub fn with_link_detector(
        mut self,
        detector: impl Fn(&Path) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_link_dir = Box::new(detector);
        self
    }

    /// Refresh the whole structure from the live filesystem, recording the
    /// wall-clock duration on it.
    ///
    /// `progress` receives the full path of each directory visited at
    /// recursion depth below the configured bound.
    pub fn refresh<F>(
        &self,
        structure: &mut DirectoryStructure,
        mut progress: F,
    ) -> Result<RefreshReport, ScanError>
    where
        F: FnMut(&Path),
    {
        let start = Instant::now();
        let mut ctx = RefreshCtx {
            progress: &mut progress,
            warnings: Vec::new(),
            dirs_scanned: 0,
        };
        self.refresh_entry(&mut structure.root, Path::new(""), 0, false, &mut ctx)?;
        let duration = start.elapsed();
        structure.mark_scanned(duration);
        Ok(RefreshReport {
            duration,
            dirs_scanned: ctx.dirs_scanned,
            warnings: ctx.warnings,
        })
    }

    fn refresh_entry(
        &self,
        entry: &mut DirectoryEntry,
        parent_path: &Path,
        depth: u32,
        is_new: bool,
        ctx: &mut RefreshCtx<'_>,
    ) -> Result<(), ScanError> {
        let full_path = entry.path_under(parent_path);
        if !full_path.is_dir() {
            mark_deleted(entry);
            return Ok(());
        }

        ctx.dirs_scanned += 1;
        if depth < self.config.progress_depth {
            (ctx.progress)(&full_path);
        }

        // Stored order is not trusted (deserialization makes no guarantee),
        // and the merge below relies on sorted children.
        entry.sort_children(&self.comparer);

        let listing = match self.read_listing(&full_path, ctx) {
            Ok(listing) => listing,
            Err(ScanError::NotFound { .. }) => {
                // Disappeared between the existence check and the listing.
                mark_deleted(entry);
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        let mut size = listing.file_bytes;

        for child in &mut entry.children {
            self.refresh_entry(child, &full_path, depth + 1, false, ctx)?;
            size += child.current_size;
        }

        for name in listing.subdirs {
            if entry.has_child_named(&name) {
                continue;
            }
            let child_path = full_path.join(name.as_str());
            if self.config.skip_link_dirs && (self.is_link_dir)(&child_path) {
                tracing::debug!(path = %child_path.display(), "skipping link directory");
                continue;
            }
            let mut child = DirectoryEntry::added(name);
            match self.refresh_entry(&mut child, &full_path, depth + 1, true, ctx) {
                Ok(()) => {
                    size += child.current_size;
                    entry.insert_child_sorted(child, &self.comparer);
                }
                Err(err) if err.is_skippable() => {
                    tracing::warn!(
                        path = %child_path.display(),
                        error = %err,
                        "skipping unreadable subdirectory"
                    );
                    ctx.warnings
                        .push(ScanWarning::skipped_subdir(child_path, &err));
                }
                Err(err) => return Err(err),
            }
        }

        entry.current_size = size;
        entry.state = if is_new {
            DirectoryState::Added
        } else if entry.current_size == entry.previous_size {
            DirectoryState::Unchanged
        } else {
            DirectoryState::Changed
        };
        Ok(())
    }

    /// One pass over a directory: direct regular-file bytes plus immediate
    /// subdirectory names. Symlinks are neither summed nor listed.
    ///
    /// Permission denied here degrades to an empty listing with a warning;
    /// not-found is returned for the caller to fold into the Deleted path.
    /// Per-entry metadata failures are recorded and the entry skipped.
    fn read_listing(&self, path: &Path, ctx: &mut RefreshCtx<'_>) -> Result<DirListing, ScanError> {
        let mut listing = DirListing::default();
        let reader = match fs::read_dir(path) {
            Ok(reader) => reader,
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                tracing::warn!(path = %path.display(), "permission denied listing directory");
                ctx.warnings.push(ScanWarning::permission_denied(path));
                return Ok(listing);
            }
            Err(err) => return Err(ScanError::io(path, err)),
        };

        for dir_entry in reader {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(err) => {
                    ctx.warnings.push(ScanWarning::metadata_error(path, &err));
                    continue;
                }
            };
            let file_type = match dir_entry.file_type() {
                Ok(t) => t,
                Err(err) => {
                    ctx.warnings
                        .push(ScanWarning::metadata_error(dir_entry.path(), &err));
                    continue;
                }
            };
            if file_type.is_dir() {
                listing
                    .subdirs
                    .push(CompactString::new(dir_entry.file_name().to_string_lossy()));
            } else if file_type.is_file() {
                match dir_entry.metadata() {
                    Ok(meta) => listing.file_bytes += meta.len(),
                    Err(err) => ctx
                        .warnings
                        .push(ScanWarning::metadata_error(dir_entry.path(), &err)),
                }
            }
        }
        Ok(listing)
    }
}

impl Default for Refresher {
    fn default() -> Self {
        Self::new()
    }
}

fn mark_deleted(entry: &mut DirectoryEntry) {
    entry.children.clear();
    entry.current_size = 0;
    entry.state = DirectoryState::Deleted;
}

struct RefreshCtx<'a> {
    progress: &'a mut dyn FnMut(&Path),
    warnings: Vec<ScanWarning>,
    dirs_scanned: u64,
}

#[derive(Default)]
struct DirListing {
    file_bytes: u64,
    subdirs: Vec<CompactString>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn structure_for(temp: &TempDir) -> DirectoryStructure {
        DirectoryStructure::new("test", temp.path().to_string_lossy().as_ref())
    }

    fn refresh(structure: &mut DirectoryStructure) -> RefreshReport {
        Refresher::new().refresh(structure, |_| {}).unwrap()
    }

    #[test]
    fn test_fresh_scan_aggregates_sizes_bottom_up() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("a.bin"), vec![0u8; 100]).unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/b.bin"), vec![0u8; 200]).unwrap();
        fs::create_dir(root.join("sub/inner")).unwrap();
        fs::write(root.join("sub/inner/c.bin"), vec![0u8; 300]).unwrap();

        let mut structure = structure_for(&temp);
        let report = refresh(&mut structure);

        assert_eq!(structure.root.current_size, 600);
        let sub = &structure.root.children[0];
        assert_eq!(sub.name.as_str(), "sub");
        assert_eq!(sub.current_size, 500);
        assert_eq!(sub.children[0].current_size, 300);
        assert_eq!(report.dirs_scanned, 3);
        assert!(!report.has_warnings());
        assert!(structure.scanned_at.is_some());
    }

    #[test]
    fn test_missing_root_becomes_deleted() {
        let mut structure = DirectoryStructure::new("test", "/no/such/dir/anywhere");
        refresh(&mut structure);

        assert_eq!(structure.root.state, DirectoryState::Deleted);
        assert_eq!(structure.root.current_size, 0);
        assert!(structure.root.children.is_empty());
    }

    #[test]
    fn test_first_scan_of_nonempty_root_is_changed() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("f"), vec![0u8; 500]).unwrap();

        let mut structure = structure_for(&temp);
        refresh(&mut structure);

        // previous_size 0 != 500, and the root itself was not newly discovered.
        assert_eq!(structure.root.state, DirectoryState::Changed);
        assert_eq!(structure.root.current_size, 500);
    }

    #[test]
    fn test_progress_reported_only_at_shallow_depth() {
        let temp = TempDir::new().unwrap();
        let mut path = temp.path().to_path_buf();
        for level in ["one", "two", "three", "four"] {
            path = path.join(level);
            fs::create_dir(&path).unwrap();
        }

        let mut structure = structure_for(&temp);
        let mut seen = Vec::new();
        Refresher::new()
            .refresh(&mut structure, |p| seen.push(p.to_path_buf()))
            .unwrap();

        // Depths 0..3: the root, "one", and "two".
        assert_eq!(seen.len(), 3);
        assert!(seen[2].ends_with("two"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_directories_are_not_added() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("real")).unwrap();
        fs::write(root.join("real/f"), vec![0u8; 64]).unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();

        let mut structure = structure_for(&temp);
        refresh(&mut structure);

        let names: Vec<&str> = structure
            .root
            .children
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["real"]);
        assert_eq!(structure.root.current_size, 64);
    }

    #[test]
    fn test_custom_link_detector_excludes_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("normal")).unwrap();
        fs::create_dir(root.join("junction")).unwrap();

        let mut structure = structure_for(&temp);
        Refresher::new()
            .with_link_detector(|p| p.ends_with("junction"))
            .refresh(&mut structure, |_| {})
            .unwrap();

        let names: Vec<&str> = structure
            .root
            .children
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["normal"]);
    }
}
