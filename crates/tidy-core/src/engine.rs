//! Apply engine
//!
//! Runs a plan either as a dry run (gates checked, one `dry_run` record, no
//! filesystem change) or for real. A real apply checks its gates in order:
//!
//! 1. approval token exists, else [`Error::Authorization`]
//! 2. `actions.len() <= policy.max_actions`, else [`Error::PolicyViolation`]
//! 3. a `dry_run` record exists for this plan id when the policy requires
//!    one, else [`Error::PolicyViolation`]
//!
//! Actions then run strictly in plan order. Each is a no-clobber rename
//! bracketed by size (and optionally fingerprint) observations. The first
//! failure stops the run. Only the failing action is reversed; actions that
//! already committed stay where they are and are visible in the ledger.

use crate::audit::{AuditEvent, AuditLedger, EventKind};
use crate::plan::{Action, Plan};
use crate::{ApprovalStore, Error, Result};
use std::path::Path;
use tidy_fs::MetaLayout;

/// Size and optional fingerprint of a file at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub size: u64,
    pub fingerprint: Option<String>,
}

/// The filesystem operations the engine performs.
pub trait FileOps {
    /// Rename without replacing anything at `dst`.
    fn rename_no_clobber(&self, src: &Path, dst: &Path) -> tidy_fs::Result<()>;

    /// Stat `path`, fingerprinting it when asked.
    fn observe(&self, path: &Path, fingerprint: bool) -> tidy_fs::Result<Observation>;
}

/// [`FileOps`] against the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileOps;

impl FileOps for LocalFileOps {
    fn rename_no_clobber(&self, src: &Path, dst: &Path) -> tidy_fs::Result<()> {
        tidy_fs::io::rename_no_clobber(src, dst)
    }

    fn observe(&self, path: &Path, fingerprint: bool) -> tidy_fs::Result<Observation> {
        let size = std::fs::metadata(path)
            .map_err(|e| tidy_fs::Error::io(path, e))?
            .len();
        let fingerprint = if fingerprint {
            Some(tidy_fs::fingerprint_file(path)?)
        } else {
            None
        };
        Ok(Observation { size, fingerprint })
    }
}

/// Dry run or real apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    DryRun,
    Commit,
}

/// What a successful invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub plan_id: String,
    pub mode: ApplyMode,
    /// Actions committed by this invocation (always 0 for a dry run)
    pub committed: usize,
    pub total: usize,
    /// One human-readable line per action
    pub lines: Vec<String>,
}

/// Gate checks and execution for plans under one root.
pub struct ApplyEngine<F: FileOps = LocalFileOps> {
    approvals: ApprovalStore,
    ledger: AuditLedger,
    ops: F,
}

impl ApplyEngine<LocalFileOps> {
    /// Engine for the root a plan targets.
    pub fn for_plan(plan: &Plan) -> Self {
        Self::new(&plan.layout())
    }

    pub fn new(layout: &MetaLayout) -> Self {
        Self::with_ops(layout, LocalFileOps)
    }
}

impl<F: FileOps> ApplyEngine<F> {
    /// Engine with substitute filesystem operations.
    pub fn with_ops(layout: &MetaLayout, ops: F) -> Self {
        Self {
            approvals: ApprovalStore::new(layout.clone()),
            ledger: AuditLedger::for_layout(layout),
            ops,
        }
    }

    pub fn ledger(&self) -> &AuditLedger {
        &self.ledger
    }

    pub fn approvals(&self) -> &ApprovalStore {
        &self.approvals
    }

    pub fn run(&self, plan: &Plan, mode: ApplyMode) -> Result<ApplyOutcome> {
        match mode {
            ApplyMode::DryRun => self.dry_run(plan),
            ApplyMode::Commit => self.apply(plan),
        }
    }

    /// Check approval and action budget, record a `dry_run`, list actions.
    pub fn dry_run(&self, plan: &Plan) -> Result<ApplyOutcome> {
        plan.validate()?;
        self.check_approved(plan)?;
        self.check_action_budget(plan)?;

        self.ledger.append(
            AuditEvent::new(EventKind::DryRun, &plan.plan_id).with("actions", plan.actions.len()),
        )?;

        let lines = plan
            .actions
            .iter()
            .map(|a| format!("[DRY] {}: {} -> {}", a.kind, a.src.display(), a.dst.display()))
            .collect();
        tracing::info!(plan_id = %plan.plan_id, actions = plan.actions.len(), "Dry run recorded");

        Ok(ApplyOutcome {
            plan_id: plan.plan_id.clone(),
            mode: ApplyMode::DryRun,
            committed: 0,
            total: plan.actions.len(),
            lines,
        })
    }

    /// Apply every action in order, stopping at the first failure.
    pub fn apply(&self, plan: &Plan) -> Result<ApplyOutcome> {
        plan.validate()?;
        self.check_approved(plan)?;
        self.check_action_budget(plan)?;
        self.check_dry_run_recorded(plan)?;

        self.ledger.append(
            AuditEvent::new(EventKind::ApplyStart, &plan.plan_id)
                .with("actions", plan.actions.len()),
        )?;
        tracing::info!(plan_id = %plan.plan_id, actions = plan.actions.len(), "Apply started");

        let mut lines = Vec::with_capacity(plan.actions.len());
        for action in &plan.actions {
            if let Err(e) = self.execute(plan, action) {
                self.record_failure(plan, action, &e);
                return Err(e);
            }
            lines.push(format!(
                "[OK] {} {}: {} -> {}",
                action.id,
                action.kind,
                action.src.display(),
                action.dst.display()
            ));
        }

        self.ledger.append(
            AuditEvent::new(EventKind::ApplyDone, &plan.plan_id).with("committed", lines.len()),
        )?;
        tracing::info!(plan_id = %plan.plan_id, committed = lines.len(), "Apply done");

        Ok(ApplyOutcome {
            plan_id: plan.plan_id.clone(),
            mode: ApplyMode::Commit,
            committed: lines.len(),
            total: plan.actions.len(),
            lines,
        })
    }

    fn check_approved(&self, plan: &Plan) -> Result<()> {
        if self.approvals.exists(&plan.plan_id) {
            return Ok(());
        }
        Err(Error::Authorization {
            plan_id: plan.plan_id.clone(),
            token: self.approvals.token_path(&plan.plan_id),
        })
    }

    fn check_action_budget(&self, plan: &Plan) -> Result<()> {
        if plan.actions.len() <= plan.policy.max_actions {
            return Ok(());
        }
        Err(Error::policy(format!(
            "plan has {} actions, policy allows at most {}",
            plan.actions.len(),
            plan.policy.max_actions
        )))
    }

    fn check_dry_run_recorded(&self, plan: &Plan) -> Result<()> {
        if !plan.policy.require_dry_run || self.ledger.has_event(&plan.plan_id, EventKind::DryRun)
        {
            return Ok(());
        }
        Err(Error::policy(format!(
            "a dry run is required before applying plan {} (no dry_run record in {})",
            plan.plan_id,
            self.ledger.path().display()
        )))
    }

    /// Move one file and verify it, reversing the move on mismatch.
    fn execute(&self, plan: &Plan, action: &Action) -> Result<()> {
        let hash = plan.policy.require_hash_verify;
        tracing::debug!(action_id = %action.id, src = %action.src.display(), dst = %action.dst.display(), "Executing action");

        if !action.src.exists() {
            return Err(Error::Precondition {
                action_id: action.id.clone(),
                message: format!("source missing: {}", action.src.display()),
            });
        }

        let pre = self.ops.observe(&action.src, hash)?;

        self.ops
            .rename_no_clobber(&action.src, &action.dst)
            .map_err(|e| match e {
                tidy_fs::Error::DestinationExists { path } => Error::Precondition {
                    action_id: action.id.clone(),
                    message: format!("destination already exists: {}", path.display()),
                },
                tidy_fs::Error::SourceMissing { path } => Error::Precondition {
                    action_id: action.id.clone(),
                    message: format!("source missing: {}", path.display()),
                },
                other => Error::Fs(other),
            })?;

        let post = match self.ops.observe(&action.dst, hash) {
            Ok(post) => post,
            Err(e) => return Err(self.fail_verification(action, format!("cannot read destination: {e}"))),
        };
        if let Some(detail) = describe_mismatch(&pre, &post) {
            return Err(self.fail_verification(action, detail));
        }

        let committed = AuditEvent::new(EventKind::ActionCommitted, &plan.plan_id)
            .with("action_id", action.id.as_str())
            .with("type", action.kind.as_str())
            .with("src", action.src.to_string_lossy().into_owned())
            .with("dst", action.dst.to_string_lossy().into_owned())
            .with("pre_size", pre.size)
            .with("post_size", post.size);
        // A move without its commit record is undone
        if let Err(e) = self.ledger.append(committed) {
            tracing::warn!(action_id = %action.id, "Could not record commit; reversing move: {}", e);
            self.roll_back(action);
            return Err(e);
        }
        Ok(())
    }

    /// Reverse the move and build the verification error.
    fn fail_verification(&self, action: &Action, detail: String) -> Error {
        let rollback_failed = !self.roll_back(action);
        Error::Verification {
            action_id: action.id.clone(),
            detail,
            rollback_failed,
        }
    }

    /// Best-effort reverse rename. Failure is logged, never raised.
    fn roll_back(&self, action: &Action) -> bool {
        match self.ops.rename_no_clobber(&action.dst, &action.src) {
            Ok(()) => {
                tracing::info!(action_id = %action.id, "Rolled back to {}", action.src.display());
                true
            }
            Err(e) => {
                tracing::warn!(
                    action_id = %action.id,
                    "Rollback failed; file remains at {}: {}",
                    action.dst.display(),
                    e
                );
                false
            }
        }
    }

    fn record_failure(&self, plan: &Plan, action: &Action, error: &Error) {
        let event = AuditEvent::new(EventKind::ApplyFailed, &plan.plan_id)
            .with("action_id", action.id.as_str())
            .with("error", error.to_string());
        if let Err(e) = self.ledger.append(event) {
            tracing::warn!(plan_id = %plan.plan_id, "Could not record apply failure: {}", e);
        }
    }
}

/// `None` when `post` matches `pre`, else a description of the difference.
fn describe_mismatch(pre: &Observation, post: &Observation) -> Option<String> {
    if pre.size != post.size {
        return Some(format!("size changed from {} to {}", pre.size, post.size));
    }
    if pre.fingerprint != post.fingerprint {
        return Some(format!(
            "fingerprint changed from {} to {}",
            pre.fingerprint.as_deref().unwrap_or("-"),
            post.fingerprint.as_deref().unwrap_or("-")
        ));
    }
    None
}
