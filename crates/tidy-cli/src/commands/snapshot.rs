//! Snapshot command implementation

use std::path::Path;

use colored::Colorize;

use tidy_fs::MetaDir;
use tidy_inventory::create_snapshot;

use crate::error::Result;

/// Run the snapshot command
pub fn run_snapshot(root: &Path, hash: bool) -> Result<()> {
    let layout = super::open_root(root)?;
    let path = layout
        .dir(MetaDir::Snapshots)
        .join(format!("snapshot_{}.json", super::file_timestamp()));

    let entries = create_snapshot(layout.root(), &path, hash)?;

    println!(
        "{} Recorded {} files{}",
        "=>".blue().bold(),
        entries.len(),
        if hash { " with fingerprints" } else { "" }
    );
    println!("{} {}", "Snapshot:".green().bold(), path.display());
    Ok(())
}
