//! Approve command implementation

use std::path::Path;

use colored::Colorize;

use tidy_core::ApprovalStore;

use crate::error::Result;

/// Run the approve command
///
/// The plan must load and validate before a token is written for it.
pub fn run_approve(plan_path: &Path) -> Result<()> {
    let plan = super::load_plan(plan_path)?;
    let token = ApprovalStore::new(plan.layout()).create(&plan.plan_id)?;

    println!("{} Plan {} approved", "OK".green().bold(), plan.plan_id.cyan());
    println!("{} {}", "Token:".green().bold(), token.path.display());
    Ok(())
}
