//! Error types for tidy-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Exit code for a caught plan/approve/apply error.
pub const EXIT_APPLICATION: i32 = 2;

/// Exit code for any other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for a usage error such as an unrecognized command.
pub const EXIT_USAGE: i32 = 64;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from tidy-core
    #[error(transparent)]
    Core(#[from] tidy_core::Error),

    /// Error from tidy-fs
    #[error(transparent)]
    Fs(#[from] tidy_fs::Error),

    /// Error from tidy-inventory
    #[error(transparent)]
    Inventory(#[from] tidy_inventory::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON rendering error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(e) if e.is_apply_error() => EXIT_APPLICATION,
            _ => EXIT_FAILURE,
        }
    }
}
