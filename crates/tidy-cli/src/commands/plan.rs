//! Plan command implementation

use std::path::Path;

use colored::Colorize;

use tidy_core::{PlanGenerator, RuleSet};
use tidy_inventory::ProviderSelector;

use crate::error::Result;

/// Run the plan command
///
/// Loads the rules for `root`, enumerates it and writes a new plan file.
/// Prints the plan path, which the other commands take as `--plan`.
pub fn run_plan(root: &Path) -> Result<()> {
    let layout = super::open_root(root)?;
    let rules = RuleSet::load(&layout)?;
    let (records, backend) = ProviderSelector::new(false).enumerate(layout.root())?;

    let plan = PlanGenerator::new(&layout, &rules).generate(&records);
    let path = plan.save(&layout)?;

    println!(
        "{} Scanned {} files via {}, proposed {} actions",
        "=>".blue().bold(),
        records.len(),
        backend.cyan(),
        plan.actions.len()
    );
    println!("{} {}", "Plan:".green().bold(), path.display());
    Ok(())
}
