//! Error types for tidy-inventory

use std::path::PathBuf;

/// Result type for tidy-inventory operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while enumerating files
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend cannot be used on this machine at all
    #[error("Inventory provider '{provider}' is unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// The backend was usable but the enumeration itself failed
    #[error("Inventory provider '{provider}' failed: {message}")]
    ProviderFailed { provider: String, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot error at {path}: {message}")]
    Snapshot { path: PathBuf, message: String },

    #[error(transparent)]
    Fs(#[from] tidy_fs::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
