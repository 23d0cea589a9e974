//! Report command implementation

use std::path::Path;

use colored::Colorize;

use tidy_fs::MetaDir;
use tidy_inventory::{ExtensionReport, ProviderSelector, write_report};

use crate::error::Result;

/// Run the report command
///
/// Enumerates `root` with the preferred provider and writes an extension
/// histogram to `_meta/reports/`. The tree itself is not modified.
pub fn run_report(root: &Path) -> Result<()> {
    let layout = super::open_root(root)?;
    let (records, backend) = ProviderSelector::new(false).enumerate(layout.root())?;

    let title = super::file_timestamp();
    let report = ExtensionReport::from_records(&title, &backend, &records);
    let path = layout.dir(MetaDir::Reports).join(format!("report_{title}.md"));
    write_report(&report, &path)?;

    println!(
        "{} Scanned {} files via {}",
        "=>".blue().bold(),
        report.files,
        backend.cyan()
    );
    println!("{} {}", "Report:".green().bold(), path.display());
    Ok(())
}
