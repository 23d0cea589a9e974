//! Error types for tidy-core

use std::path::PathBuf;

/// Result type for tidy-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while planning or applying
///
/// The first five variants are the apply taxonomy: each one aborts the
/// current invocation and is never retried. A failed rollback is not an
/// error of its own; it is logged and flagged on [`Error::Verification`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed plan, policy or rules file
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// No approval token for the plan
    #[error("Plan {plan_id} is not approved (missing {})", token.display())]
    Authorization { plan_id: String, token: PathBuf },

    /// Action budget exceeded or required dry run not recorded
    #[error("Policy violation: {message}")]
    PolicyViolation { message: String },

    /// Source missing or destination occupied
    #[error("Precondition failed for action {action_id}: {message}")]
    Precondition { action_id: String, message: String },

    /// Post-move size or fingerprint differs from pre-move
    #[error(
        "Verification failed for action {action_id}: {detail}{}",
        if *rollback_failed { " (rollback failed; file left at destination)" } else { "" }
    )]
    Verification {
        action_id: String,
        detail: String,
        rollback_failed: bool,
    },

    /// A ledger line could not be parsed
    #[error("Audit ledger {} is corrupt at line {line}: {message}", path.display())]
    LedgerCorrupt {
        path: PathBuf,
        line: usize,
        message: String,
    },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from tidy-fs
    #[error(transparent)]
    Fs(#[from] tidy_fs::Error),

    /// Inventory error from tidy-inventory
    #[error(transparent)]
    Inventory(#[from] tidy_inventory::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn policy(message: impl Into<String>) -> Self {
        Self::PolicyViolation {
            message: message.into(),
        }
    }

    /// Whether this is one of the typed apply failures (as opposed to an
    /// unexpected I/O or serialization fault).
    pub fn is_apply_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::Authorization { .. }
                | Self::PolicyViolation { .. }
                | Self::Precondition { .. }
                | Self::Verification { .. }
        )
    }
}
