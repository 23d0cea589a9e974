//! Point-in-time inventory snapshots
//!
//! A snapshot is a JSON array of [`SnapshotEntry`] with root-relative,
//! forward-slash paths. Snapshots are informational: nothing in the apply
//! path reads them.

use crate::{Error, InventoryProvider, LocalWalkProvider, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tidy_fs::{NormalizedPath, io};

/// One file as recorded in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub path: String,
    pub size_bytes: u64,
    pub mtime_ns: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// Walk `root` and write its inventory to `snapshot_path`.
pub fn create_snapshot(
    root: &Path,
    snapshot_path: &Path,
    hash_files: bool,
) -> Result<Vec<SnapshotEntry>> {
    let records = LocalWalkProvider::new()
        .with_hashing(hash_files)
        .enumerate(root)?;

    let entries: Vec<SnapshotEntry> = records
        .into_iter()
        .filter_map(|r| {
            let rel = NormalizedPath::relative(&r.path, root)?;
            Some(SnapshotEntry {
                path: rel.to_string(),
                size_bytes: r.size_bytes,
                mtime_ns: r.mtime_ns,
                content_hash: r.content_hash,
            })
        })
        .collect();

    let content = serde_json::to_string_pretty(&entries).map_err(|e| Error::Snapshot {
        path: snapshot_path.to_path_buf(),
        message: e.to_string(),
    })?;
    io::write_text(&NormalizedPath::new(snapshot_path), &content)?;

    tracing::info!(path = %snapshot_path.display(), files = entries.len(), "Snapshot written");
    Ok(entries)
}

/// Read a snapshot written by [`create_snapshot`].
pub fn load_snapshot(snapshot_path: &Path) -> Result<Vec<SnapshotEntry>> {
    let content = io::read_text(&NormalizedPath::new(snapshot_path))?;
    serde_json::from_str(&content).map_err(|e| Error::Snapshot {
        path: snapshot_path.to_path_buf(),
        message: e.to_string(),
    })
}
