//! dirsnap - directory size snapshots with added/removed/changed diffing.
//!
//! Usage:
//!   dirsnap scan [PATH]      Scan and diff against the saved baseline
//!   dirsnap commit [PATH]    Scan and accept the result as the new baseline
//!   dirsnap show [PATH]      Print the saved snapshot without scanning
//!   dirsnap list             List saved snapshot labels
//!   dirsnap export [PATH]    Export the saved snapshot as JSON
//!   dirsnap --help           Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};

use dirsnap_core::{DirectoryEntry, DirectoryState, DirectoryStructure, display_size};
use dirsnap_scan::{RefreshEvent, RefreshReport, Refresher, start_refresh};
use dirsnap_store::SnapshotStore;

#[derive(Parser)]
#[command(
    name = "dirsnap",
    version,
    about = "Directory size snapshots with added/removed/changed diffing",
    long_about = "dirsnap keeps a per-directory baseline of a tree's size\n\
                  distribution. Each scan reports which subdirectories were\n\
                  added, removed, or changed in size since the baseline;\n\
                  committing a scan makes it the new baseline."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a tree and diff it against the saved baseline
    Scan {
        /// Root path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Snapshot label (defaults to a name derived from the path)
        #[arg(short, long)]
        label: Option<String>,

        /// Maximum depth to display
        #[arg(short, long, default_value = "3")]
        depth: u32,

        /// Commit the scan as the new baseline afterwards
        #[arg(short, long)]
        commit: bool,
    },

    /// Scan and accept the result as the new baseline
    Commit {
        /// Root path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Snapshot label (defaults to a name derived from the path)
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Print the saved snapshot without scanning
    Show {
        /// Root path the snapshot was taken of
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Snapshot label (defaults to a name derived from the path)
        #[arg(short, long)]
        label: Option<String>,

        /// Maximum depth to display
        #[arg(short, long, default_value = "3")]
        depth: u32,
    },

    /// List saved snapshot labels
    List,

    /// Export the saved snapshot as JSON
    Export {
        /// Root path the snapshot was taken of
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Snapshot label (defaults to a name derived from the path)
        #[arg(short, long)]
        label: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            path,
            label,
            depth,
            commit,
        } => run_scan(&path, label, depth, commit).await,
        Command::Commit { path, label } => run_commit(&path, label).await,
        Command::Show { path, label, depth } => run_show(&path, label, depth),
        Command::List => run_list(),
        Command::Export {
            path,
            label,
            output,
        } => run_export(&path, label, output),
    }
}

/// Scan, print the diff tree, optionally commit.
async fn run_scan(path: &Path, label: Option<String>, depth: u32, commit: bool) -> Result<()> {
    let store = SnapshotStore::open()?;
    let (mut structure, report) = refresh_from(&store, path, label).await?;

    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} - {}",
        structure.root.name,
        display_size(structure.root.current_size as i64)
    );
    println!(
        " {} directories scanned in {:.2}s",
        report.dirs_scanned, structure.last_scan_secs
    );
    println!("{}", "─".repeat(60));
    println!();

    print_entry(&structure.root, 0, depth);

    if report.has_warnings() {
        println!();
        println!("{} warning(s) during scan", report.warnings.len());
    }

    if commit {
        structure.snapshot();
        store.save(&structure)?;
        println!();
        println!("Committed baseline \"{}\".", structure.drive);
    } else {
        println!();
        println!(
            "Run `dirsnap commit {}` to accept this as the new baseline.",
            structure.root.name
        );
    }

    Ok(())
}

/// Scan and accept the result as the new baseline.
async fn run_commit(path: &Path, label: Option<String>) -> Result<()> {
    let store = SnapshotStore::open()?;
    let (mut structure, report) = refresh_from(&store, path, label).await?;

    structure.snapshot();
    store.save(&structure)?;

    println!(
        "Committed \"{}\": {} entries, total {} ({} directories scanned in {:.2}s).",
        structure.drive,
        structure.root.entry_count(),
        display_size(structure.root.current_size as i64),
        report.dirs_scanned,
        structure.last_scan_secs
    );
    if report.has_warnings() {
        println!("{} warning(s) during scan", report.warnings.len());
    }

    Ok(())
}

/// Print the saved snapshot without touching the filesystem.
fn run_show(path: &Path, label: Option<String>, depth: u32) -> Result<()> {
    let store = SnapshotStore::open()?;
    let label = resolve_label(path, label)?;

    match store.load(&label)? {
        Some(structure) => {
            println!(" {} (label \"{}\")", structure.root.name, structure.drive);
            if let Some(at) = structure.scanned_at {
                println!(" last scanned {at} in {:.2}s", structure.last_scan_secs);
            }
            println!();
            print_entry(&structure.root, 0, depth);
        }
        None => println!("No snapshot saved for \"{label}\"."),
    }

    Ok(())
}

/// List saved snapshot labels.
fn run_list() -> Result<()> {
    let store = SnapshotStore::open()?;
    let drives = store.list()?;

    if drives.is_empty() {
        println!("No snapshots saved.");
    } else {
        for drive in drives {
            println!("{drive}");
        }
    }

    Ok(())
}

/// Export the saved snapshot as JSON.
fn run_export(path: &Path, label: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let store = SnapshotStore::open()?;
    let label = resolve_label(path, label)?;

    let structure = store
        .load(&label)?
        .ok_or_else(|| eyre!("no snapshot saved for \"{label}\""))?;
    let json = serde_json::to_string_pretty(&structure)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{json}");
        }
    }

    Ok(())
}

/// Load the baseline for `path` and refresh it in the background, printing
/// progress as it arrives.
async fn refresh_from(
    store: &SnapshotStore,
    path: &Path,
    label: Option<String>,
) -> Result<(DirectoryStructure, RefreshReport)> {
    let path = path.canonicalize().context("Invalid path")?;
    if !path.is_dir() {
        return Err(eyre!("{} is not a directory", path.display()));
    }
    let label = resolve_label(&path, label)?;
    let structure = store.load_or_fresh(&label, path.to_string_lossy().as_ref());

    eprintln!("Scanning {}...", path.display());

    let mut events = start_refresh(structure, Refresher::new());
    let mut outcome = None;
    while let Some(event) = events.recv().await {
        match event {
            RefreshEvent::Progress(progress) => {
                eprintln!("  {}", progress.path.display());
            }
            RefreshEvent::Complete { structure, report } => {
                outcome = Some((structure, report));
            }
            RefreshEvent::Failed { error, .. } => {
                return Err(error).context("Scan failed");
            }
        }
    }

    outcome.ok_or_else(|| eyre!("scan finished without a result"))
}

/// Snapshot label: explicit, or derived from the canonical path.
fn resolve_label(path: &Path, label: Option<String>) -> Result<String> {
    match label {
        Some(label) => Ok(label),
        None => {
            let path = path.canonicalize().context("Invalid path")?;
            Ok(label_for_path(&path))
        }
    }
}

/// Derive a label from a canonical path: normal components joined with
/// '-', or "root" for the filesystem root itself.
fn label_for_path(path: &Path) -> String {
    let label = path
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("-");

    if label.is_empty() {
        "root".to_string()
    } else {
        label
    }
}

/// Print an entry and its children to a depth limit.
fn print_entry(entry: &DirectoryEntry, depth: u32, max_depth: u32) {
    let indent = "  ".repeat(depth as usize);
    let delta = if entry.size_delta() != 0 {
        entry.delta_string()
    } else {
        String::new()
    };

    println!(
        "{}{} {:<40} {:>10} {:>10}",
        indent,
        state_marker(entry.state),
        truncate(entry.name.as_str(), 40),
        entry.current_size_string(),
        delta
    );

    if depth < max_depth {
        for child in &entry.children {
            print_entry(child, depth + 1, max_depth);
        }
    }
}

fn state_marker(state: DirectoryState) -> char {
    match state {
        DirectoryState::Unchanged => ' ',
        DirectoryState::Changed => '~',
        DirectoryState::Added => '+',
        DirectoryState::Deleted => '-',
    }
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_len.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
