//! Declarative generation rules
//!
//! Rules decide which files get an action and where they go. The default
//! rule set quarantines `*.tmp` and `*.bak`; `_meta/rules.{toml,json,yaml}`
//! overrides it.

use super::{ActionKind, Policy};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tidy_fs::{ConfigStore, MetaLayout, NormalizedPath, QUARANTINE_DIR_NAME};
use tidy_inventory::FileRecord;

/// File names checked for a rules override, in order.
const RULES_FILES: [&str; 4] = ["rules.toml", "rules.json", "rules.yaml", "rules.yml"];

/// An action a rule wants for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedAction {
    pub kind: ActionKind,
    pub dst: PathBuf,
}

/// A replaceable generation rule.
pub trait Rule {
    /// Propose at most one action for `record`.
    fn propose(&self, record: &FileRecord) -> Option<ProposedAction>;
}

/// Moves files with a listed extension into a flat isolation directory.
#[derive(Debug, Clone)]
pub struct QuarantineRule {
    dir: PathBuf,
    extensions: HashSet<String>,
}

impl QuarantineRule {
    /// `extensions` are matched case-insensitively; a leading dot is ignored.
    pub fn new(dir: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            dir: dir.into(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Rule for QuarantineRule {
    fn propose(&self, record: &FileRecord) -> Option<ProposedAction> {
        // Already isolated
        if record.path.starts_with(&self.dir) {
            return None;
        }
        let ext = record.extension()?;
        if !self.extensions.contains(&ext) {
            return None;
        }
        let name = record.path.file_name()?;
        Some(ProposedAction {
            kind: ActionKind::Quarantine,
            dst: self.dir.join(name),
        })
    }
}

/// Policy values stamped into newly generated plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyDefaults {
    pub require_hash_verify: bool,
    pub require_dry_run: bool,
    pub max_actions: usize,
}

impl Default for PolicyDefaults {
    fn default() -> Self {
        let policy = Policy::default();
        Self {
            require_hash_verify: policy.require_hash_verify,
            require_dry_run: policy.require_dry_run,
            max_actions: policy.max_actions,
        }
    }
}

impl From<&PolicyDefaults> for Policy {
    fn from(defaults: &PolicyDefaults) -> Self {
        Policy {
            allow_delete: false,
            require_hash_verify: defaults.require_hash_verify,
            require_dry_run: defaults.require_dry_run,
            max_actions: defaults.max_actions,
        }
    }
}

/// The rule configuration of one managed root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Isolation directory, relative to the root
    pub quarantine_dir: String,
    pub quarantine_extensions: Vec<String>,
    pub policy: PolicyDefaults,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            quarantine_dir: QUARANTINE_DIR_NAME.to_string(),
            quarantine_extensions: vec!["tmp".into(), "bak".into()],
            policy: PolicyDefaults::default(),
        }
    }
}

impl RuleSet {
    /// Load the first `_meta/rules.*` file present, or the defaults.
    pub fn load(layout: &MetaLayout) -> Result<Self> {
        let store = ConfigStore::new();
        for name in RULES_FILES {
            let path = layout.meta_root().join(name);
            if !path.is_file() {
                continue;
            }
            tracing::debug!(?path, "Loading rules override");
            let rules: RuleSet = store
                .load(&NormalizedPath::new(&path))
                .map_err(|e| Error::configuration(e.to_string()))?;
            rules.validate()?;
            return Ok(rules);
        }
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        let dir = Path::new(&self.quarantine_dir);
        if self.quarantine_dir.is_empty()
            || dir.is_absolute()
            || dir.components().any(|c| c.as_os_str() == "..")
        {
            return Err(Error::configuration(format!(
                "quarantine_dir must be a relative path inside the root, got {:?}",
                self.quarantine_dir
            )));
        }
        Ok(())
    }

    /// The quarantine rule for `layout`'s root.
    pub fn quarantine_rule(&self, layout: &MetaLayout) -> QuarantineRule {
        QuarantineRule::new(
            layout.quarantine_dir(Some(&self.quarantine_dir)),
            &self.quarantine_extensions,
        )
    }

    /// Policy for a new plan.
    pub fn policy(&self) -> Policy {
        Policy::from(&self.policy)
    }
}
