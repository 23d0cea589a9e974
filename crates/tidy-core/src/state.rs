//! Derived plan state
//!
//! There is no stored status field. State is a pure function of the approval
//! store, the ledger and the plan, recomputed on every call, so it is exact
//! after a crash or restart.
//!
//! ```text
//! UNAPPROVED -> APPROVED -> DRY_RUN_DONE -> APPLYING -> DONE
//!                                              |
//!                                              +-> FAILED
//! ```

use crate::{ApprovalStore, AuditLedger, EventKind, Plan, Result};
use std::collections::HashSet;

/// Lifecycle position of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    Unapproved,
    Approved,
    DryRunDone,
    /// Started with no terminal event yet: running, or the process died
    Applying,
    Done,
    Failed,
}

impl std::fmt::Display for PlanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unapproved => "UNAPPROVED",
            Self::Approved => "APPROVED",
            Self::DryRunDone => "DRY_RUN_DONE",
            Self::Applying => "APPLYING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// State plus progress counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStatus {
    pub plan_id: String,
    pub state: PlanState,
    /// Distinct actions of this plan with an `action_committed` record
    pub committed: usize,
    pub total: usize,
}

impl PlanStatus {
    pub fn uncommitted(&self) -> usize {
        self.total.saturating_sub(self.committed)
    }
}

/// Compute the status of `plan` from durable artifacts.
///
/// # Errors
///
/// A corrupt ledger is an error here rather than a guessed state.
pub fn derive_status(
    plan: &Plan,
    approvals: &ApprovalStore,
    ledger: &AuditLedger,
) -> Result<PlanStatus> {
    let events = ledger.events_for(&plan.plan_id)?;

    let committed = events
        .iter()
        .filter(|e| e.event == EventKind::ActionCommitted)
        .filter_map(|e| e.field_str("action_id"))
        .collect::<HashSet<_>>()
        .len();

    let state = if !approvals.exists(&plan.plan_id) {
        PlanState::Unapproved
    } else {
        match events.iter().rposition(|e| e.event == EventKind::ApplyStart) {
            None if events.iter().any(|e| e.event == EventKind::DryRun) => PlanState::DryRunDone,
            None => PlanState::Approved,
            Some(start) => {
                let tail = &events[start + 1..];
                if tail.iter().any(|e| e.event == EventKind::ApplyDone) {
                    PlanState::Done
                } else if tail.iter().any(|e| e.event == EventKind::ApplyFailed) {
                    PlanState::Failed
                } else {
                    PlanState::Applying
                }
            }
        }
    };

    Ok(PlanStatus {
        plan_id: plan.plan_id.clone(),
        state,
        committed,
        total: plan.actions.len(),
    })
}
