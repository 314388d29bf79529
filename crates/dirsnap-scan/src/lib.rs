//! Filesystem refresh engine for dirsnap.
//!
//! This crate walks the live filesystem and merges what it finds into a
//! previously persisted snapshot tree. Key pieces:
//!
//! - **[`Refresher`]** - the recursive scan+merge, preserving identity and
//!   size history for surviving entries
//! - **[`start_refresh`]** - background orchestration with progress events
//!   over a channel
//! - **Link safety** - symlink directories are never traversed or added
//!
//! # Example
//!
//! ```rust,no_run
//! use dirsnap_core::DirectoryStructure;
//! use dirsnap_scan::Refresher;
//!
//! let mut structure = DirectoryStructure::new("data", "/srv/data");
//! let report = Refresher::new()
//!     .refresh(&mut structure, |path| eprintln!("scanning {}", path.display()))
//!     .unwrap();
//!
//! println!("scanned {} dirs in {:.2}s", report.dirs_scanned, report.duration.as_secs_f64());
//! ```
//!
//! # Background refresh
//!
//! ```rust,no_run
//! use dirsnap_core::DirectoryStructure;
//! use dirsnap_scan::{RefreshEvent, Refresher, start_refresh};
//!
//! # async fn run() {
//! let structure = DirectoryStructure::new("data", "/srv/data");
//! let mut events = start_refresh(structure, Refresher::new());
//! while let Some(event) = events.recv().await {
//!     match event {
//!         RefreshEvent::Progress(p) => eprintln!("{}", p.path.display()),
//!         RefreshEvent::Complete { structure, .. } => {
//!             println!("total: {}", structure.root.current_size);
//!         }
//!         RefreshEvent::Failed { error, .. } => eprintln!("failed: {error}"),
//!     }
//! }
//! # }
//! ```

mod link;
mod progress;
mod refresh;
mod scanner;

pub use link::is_link_dir;
pub use progress::{RefreshProgress, RefreshReport};
pub use refresh::{LinkDetector, Refresher};
pub use scanner::{RefreshEvent, start_refresh};

// Re-export core types for convenience
pub use dirsnap_core::{
    DirectoryEntry, DirectoryState, DirectoryStructure, RefreshConfig, ScanError, ScanWarning,
    WarningKind,
};
