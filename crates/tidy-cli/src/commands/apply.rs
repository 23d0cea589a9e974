//! Apply command implementation

use std::path::Path;

use colored::Colorize;

use tidy_core::{ApplyEngine, ApplyMode};

use crate::error::Result;

/// Run the apply command
///
/// With `dry_run` the engine checks its gates, records the dry run and
/// lists what would move. Without it, files are moved for real.
pub fn run_apply(plan_path: &Path, dry_run: bool) -> Result<()> {
    let plan = super::load_plan(plan_path)?;
    let mode = if dry_run {
        ApplyMode::DryRun
    } else {
        ApplyMode::Commit
    };

    let outcome = ApplyEngine::for_plan(&plan).run(&plan, mode)?;

    for line in &outcome.lines {
        println!("{}", line);
    }
    match outcome.mode {
        ApplyMode::DryRun => println!(
            "{} Dry run recorded for {} ({} actions)",
            "OK".green().bold(),
            outcome.plan_id.cyan(),
            outcome.total
        ),
        ApplyMode::Commit => println!(
            "{} Applied {} ({}/{} actions committed)",
            "OK".green().bold(),
            outcome.plan_id.cyan(),
            outcome.committed,
            outcome.total
        ),
    }
    Ok(())
}
