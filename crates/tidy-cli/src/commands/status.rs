//! Status command implementation

use std::path::Path;

use colored::Colorize;

use tidy_core::{ApprovalStore, AuditLedger, PlanState, derive_status};

use crate::error::Result;

/// Run the status command
///
/// State is derived from the approval token and the ledger on every call.
pub fn run_status(plan_path: &Path, json: bool) -> Result<()> {
    let plan = super::load_plan(plan_path)?;
    let layout = plan.layout();
    let approvals = ApprovalStore::new(layout.clone());
    let ledger = AuditLedger::for_layout(&layout);
    let status = derive_status(&plan, &approvals, &ledger)?;

    if json {
        let value = serde_json::json!({
            "plan_id": status.plan_id,
            "state": status.state.to_string(),
            "committed": status.committed,
            "total": status.total,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let state = status.state.to_string();
    let state = match status.state {
        PlanState::Done => state.green().bold(),
        PlanState::Failed => state.red().bold(),
        PlanState::Applying => state.yellow().bold(),
        PlanState::Unapproved => state.dimmed(),
        PlanState::Approved | PlanState::DryRunDone => state.cyan().bold(),
    };
    println!("{} {}", "Plan:".bold(), status.plan_id);
    println!("{} {}", "State:".bold(), state);
    println!(
        "{} {}/{} committed",
        "Actions:".bold(),
        status.committed,
        status.total
    );
    if status.state == PlanState::Applying {
        println!(
            "{} No terminal ledger record; the last apply may have been interrupted.",
            "!".yellow().bold()
        );
    }
    Ok(())
}
