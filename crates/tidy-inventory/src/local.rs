//! Raw directory walk

use crate::{Error, FileRecord, InventoryProvider, Result};
use std::path::Path;
use tidy_fs::layout::is_meta_relative;
use walkdir::WalkDir;

/// Walks the tree directly. Always available, slower than an index.
///
/// Entries are visited in file-name order within each directory, which makes
/// the output order deterministic. Symlinks are not followed.
#[derive(Debug, Clone, Default)]
pub struct LocalWalkProvider {
    hash_files: bool,
}

impl LocalWalkProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint every file while walking.
    pub fn with_hashing(mut self, hash_files: bool) -> Self {
        self.hash_files = hash_files;
        self
    }
}

impl InventoryProvider for LocalWalkProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn enumerate(&self, root: &Path) -> Result<Vec<FileRecord>> {
        if !root.is_dir() {
            return Err(Error::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "root is not a directory"),
            ));
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.path()
                    .strip_prefix(root)
                    .map(|rel| !is_meta_relative(rel))
                    .unwrap_or(false)
            });

        let mut records = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match FileRecord::from_path(entry.path(), self.hash_files) {
                Ok(record) => records.push(record),
                // Vanished or unreadable between listing and stat
                Err(e) => tracing::debug!("Skipping {}: {}", entry.path().display(), e),
            }
        }

        tracing::debug!(root = %root.display(), count = records.len(), "Local walk complete");
        Ok(records)
    }
}
