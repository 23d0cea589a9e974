//! Metadata layout of a managed root
//!
//! Every managed directory carries a `_meta` subtree holding plans, approval
//! tokens, the audit ledger, reports and snapshots:
//!
//! ```text
//! <root>/
//!   _meta/
//!     inventory/  reports/  plans/  audit/  snapshots/  approvals/
//! ```

use crate::constants::{META_DIR_NAME, MetaDir, QUARANTINE_DIR_NAME};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved paths for one managed root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaLayout {
    root: PathBuf,
}

impl MetaLayout {
    /// Build the layout for `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Canonicalize `root` and create every metadata directory.
    ///
    /// `dunce` keeps Windows paths free of the `\\?\` prefix so plan files
    /// stay readable.
    pub fn ensure(root: &Path) -> Result<Self> {
        let root = dunce::canonicalize(root).map_err(|e| Error::io(root, e))?;
        let layout = Self::new(root);
        for dir in MetaDir::ALL {
            let path = layout.dir(dir);
            fs::create_dir_all(&path).map_err(|e| Error::io(&path, e))?;
        }
        tracing::debug!(root = %layout.root.display(), "Metadata layout ready");
        Ok(layout)
    }

    /// The managed root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/_meta`
    pub fn meta_root(&self) -> PathBuf {
        self.root.join(META_DIR_NAME)
    }

    /// `<root>/_meta/<dir>`
    pub fn dir(&self, dir: MetaDir) -> PathBuf {
        self.meta_root().join(dir)
    }

    /// Isolation directory for quarantined files.
    pub fn quarantine_dir(&self, name: Option<&str>) -> PathBuf {
        self.root.join(name.unwrap_or(QUARANTINE_DIR_NAME))
    }

    /// `plans/plan_<id>.json`
    pub fn plan_path(&self, plan_id: &str) -> PathBuf {
        self.dir(MetaDir::Plans).join(format!("plan_{plan_id}.json"))
    }

    /// `approvals/APPROVED__<id>.token`
    pub fn approval_token_path(&self, plan_id: &str) -> PathBuf {
        self.dir(MetaDir::Approvals)
            .join(format!("APPROVED__{plan_id}.token"))
    }

    /// `audit/audit.jsonl`
    pub fn audit_log_path(&self) -> PathBuf {
        self.dir(MetaDir::Audit).join("audit.jsonl")
    }

    /// Whether `path` lies inside this root's metadata subtree.
    pub fn is_meta_path(&self, path: &Path) -> bool {
        is_meta_relative(path.strip_prefix(&self.root).unwrap_or(path))
    }
}

/// Whether a root-relative path has a `_meta` component anywhere.
pub fn is_meta_relative(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str() == META_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_paths_follow_naming_scheme() {
        let layout = MetaLayout::new("/data");
        assert_eq!(
            layout.plan_path("p1"),
            PathBuf::from("/data/_meta/plans/plan_p1.json")
        );
        assert_eq!(
            layout.approval_token_path("p1"),
            PathBuf::from("/data/_meta/approvals/APPROVED__p1.token")
        );
        assert_eq!(
            layout.audit_log_path(),
            PathBuf::from("/data/_meta/audit/audit.jsonl")
        );
        assert_eq!(
            layout.quarantine_dir(None),
            PathBuf::from("/data/99_QUARANTINE")
        );
    }

    #[test]
    fn meta_paths_are_detected_at_any_depth() {
        let layout = MetaLayout::new("/data");
        assert!(layout.is_meta_path(Path::new("/data/_meta/plans/x.json")));
        assert!(layout.is_meta_path(Path::new("/data/sub/_meta/x")));
        assert!(!layout.is_meta_path(Path::new("/data/meta/x")));
    }
}
