//! Command implementations for tidy-cli

pub mod apply;
pub mod approve;
pub mod plan;
pub mod report;
pub mod snapshot;
pub mod status;

pub use apply::run_apply;
pub use approve::run_approve;
pub use plan::run_plan;
pub use report::run_report;
pub use snapshot::run_snapshot;
pub use status::run_status;

use std::path::Path;

use chrono::Utc;
use tidy_core::Plan;
use tidy_fs::MetaLayout;

use crate::error::{CliError, Result};

/// UTC timestamp used in report and snapshot file names.
fn file_timestamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// Load the plan a `--plan` argument names.
fn load_plan(path: &Path) -> Result<Plan> {
    if !path.is_file() {
        return Err(CliError::user(format!("plan file not found: {}", path.display())));
    }
    Ok(Plan::load(path)?)
}

/// Open the `_meta` layout of an existing `--root` directory.
fn open_root(root: &Path) -> Result<MetaLayout> {
    if !root.is_dir() {
        return Err(CliError::user(format!("root is not a directory: {}", root.display())));
    }
    Ok(MetaLayout::ensure(root)?)
}
