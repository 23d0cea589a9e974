//! Names of the metadata directories kept inside a managed root.

use std::path::Path;

/// Name of the metadata root nested inside every managed directory.
pub const META_DIR_NAME: &str = "_meta";

/// Default isolation directory for quarantined files, relative to the root.
pub const QUARANTINE_DIR_NAME: &str = "99_QUARANTINE";

/// Subdirectories of the metadata root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaDir {
    /// Raw inventory exports
    Inventory,
    /// Human-readable reports
    Reports,
    /// Plan files (`plan_<id>.json`)
    Plans,
    /// The append-only audit ledger
    Audit,
    /// Inventory snapshots
    Snapshots,
    /// Approval tokens
    Approvals,
}

impl MetaDir {
    /// Every metadata subdirectory, in creation order.
    pub const ALL: [MetaDir; 6] = [
        Self::Inventory,
        Self::Reports,
        Self::Plans,
        Self::Audit,
        Self::Snapshots,
        Self::Approvals,
    ];

    /// Get the string representation of the directory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Reports => "reports",
            Self::Plans => "plans",
            Self::Audit => "audit",
            Self::Snapshots => "snapshots",
            Self::Approvals => "approvals",
        }
    }
}

impl AsRef<Path> for MetaDir {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for MetaDir {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for MetaDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
