//! Plan model
//!
//! A plan is written once by the [`PlanGenerator`] and never modified
//! afterwards. Its policy travels with it, so whether an apply is allowed
//! can be decided from the plan file, the approval token and the ledger.

mod generator;
mod rules;

pub use generator::{PlanGenerator, new_plan_id};
pub use rules::{PolicyDefaults, ProposedAction, QuarantineRule, Rule, RuleSet};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tidy_fs::{ConfigStore, MetaLayout, NormalizedPath};

/// What an action does. There is deliberately no delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Rename,
    /// A move into the isolation directory
    Quarantine,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Rename => "rename",
            Self::Quarantine => "quarantine",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proposed file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Sequential id, unique within the plan (e.g. `A-001`)
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub src: PathBuf,
    pub dst: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_max_actions() -> usize {
    200
}

/// Apply-time rules carried inside the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Always `false`; a plan claiming otherwise is rejected.
    #[serde(default)]
    pub allow_delete: bool,
    #[serde(default = "default_true")]
    pub require_hash_verify: bool,
    #[serde(default = "default_true")]
    pub require_dry_run: bool,
    #[serde(default = "default_max_actions")]
    pub max_actions: usize,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allow_delete: false,
            require_hash_verify: true,
            require_dry_run: true,
            max_actions: default_max_actions(),
        }
    }
}

/// An immutable list of actions plus the policy they are applied under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,
    pub root: PathBuf,
    pub policy: Policy,
    pub actions: Vec<Action>,
}

impl Plan {
    /// Load and validate a plan file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file does not parse or fails
    /// [`Plan::validate`]. A missing file is an I/O error.
    pub fn load(path: &Path) -> Result<Self> {
        let plan: Plan = ConfigStore::new()
            .load(&NormalizedPath::new(path))
            .map_err(|e| match e {
                tidy_fs::Error::ConfigParse { .. } | tidy_fs::Error::UnsupportedFormat { .. } => {
                    Error::configuration(e.to_string())
                }
                other => Error::Fs(other),
            })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Write the plan to `plans/plan_<id>.json` under `layout`.
    pub fn save(&self, layout: &MetaLayout) -> Result<PathBuf> {
        self.validate()?;
        let path = layout.plan_path(&self.plan_id);
        ConfigStore::new().save(&NormalizedPath::new(&path), self)?;
        tracing::info!(plan_id = %self.plan_id, actions = self.actions.len(), "Plan written");
        Ok(path)
    }

    /// Check the structural invariants of a plan.
    ///
    /// - the plan id is usable as a file name component
    /// - `allow_delete` is false
    /// - action ids are non-empty and unique
    pub fn validate(&self) -> Result<()> {
        validate_plan_id(&self.plan_id)?;
        if self.policy.allow_delete {
            return Err(Error::configuration(format!(
                "plan {} sets allow_delete = true; delete is not supported",
                self.plan_id
            )));
        }
        let mut seen = HashSet::new();
        for action in &self.actions {
            if action.id.trim().is_empty() {
                return Err(Error::configuration("action with empty id"));
            }
            if !seen.insert(action.id.as_str()) {
                return Err(Error::configuration(format!(
                    "duplicate action id {}",
                    action.id
                )));
            }
        }
        Ok(())
    }

    /// Layout of the root this plan targets.
    pub fn layout(&self) -> MetaLayout {
        MetaLayout::new(&self.root)
    }
}

/// Plan ids become parts of file names, so keep them to a safe alphabet.
fn validate_plan_id(plan_id: &str) -> Result<()> {
    let ok = !plan_id.is_empty()
        && !plan_id.starts_with('.')
        && plan_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(Error::configuration(format!("invalid plan id {plan_id:?}")))
    }
}
