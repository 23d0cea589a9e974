//! InventoryProvider trait

use crate::{FileRecord, Result};
use std::path::{Path, PathBuf};
use tidy_fs::layout::is_meta_relative;

/// A backend that can enumerate the regular files under a root.
///
/// Implementations must:
/// - exclude every path with a `_meta` component relative to `root`
/// - return records in an order that is deterministic for an unchanged tree
pub trait InventoryProvider {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Cheap check: can this backend be used right now?
    fn is_available(&self) -> bool;

    /// Enumerate files under `root`.
    fn enumerate(&self, root: &Path) -> Result<Vec<FileRecord>>;
}

/// Records for the regular files among `paths` that lie under `root` and
/// outside its `_meta` subtree, sorted by path with duplicates removed.
///
/// Index backends return stale or foreign entries; anything that no longer
/// stats as a file is dropped.
pub(crate) fn records_under(root: &Path, paths: Vec<PathBuf>, hash_files: bool) -> Vec<FileRecord> {
    let mut paths: Vec<PathBuf> = paths
        .into_iter()
        .filter(|p| {
            p.strip_prefix(root)
                .map(|rel| !is_meta_relative(rel))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    paths.dedup();

    paths
        .iter()
        .filter(|p| p.is_file())
        .filter_map(|p| match FileRecord::from_path(p, hash_files) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("Skipping {}: {}", p.display(), e);
                None
            }
        })
        .collect()
}
