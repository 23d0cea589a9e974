//! The unit of inventory output

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// One regular file found under an inventory root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Size in bytes at enumeration time
    pub size_bytes: u64,
    /// Modification time in nanoseconds since the Unix epoch
    pub mtime_ns: u64,
    /// `sha256:<hex>` fingerprint, when the provider was asked to hash
    pub content_hash: Option<String>,
}

impl FileRecord {
    /// Stat `path` (and optionally fingerprint it) into a record.
    pub fn from_path(path: &Path, hash: bool) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| Error::io(path, e))?;
        let mtime_ns = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        let content_hash = if hash {
            Some(tidy_fs::fingerprint_file(path)?)
        } else {
            None
        };
        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            mtime_ns,
            content_hash,
        })
    }

    /// Lowercased extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}
