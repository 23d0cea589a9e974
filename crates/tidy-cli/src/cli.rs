//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tidy - Reorganize a file tree through approved, audited plans
#[derive(Parser, Debug)]
#[command(name = "tidy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write an extension report for a tree (read-only)
    Report {
        /// Root of the managed tree
        #[arg(long)]
        root: PathBuf,
    },

    /// Generate a plan for a tree
    ///
    /// Writes `_meta/plans/plan_<id>.json` and changes nothing else.
    Plan {
        /// Root of the managed tree
        #[arg(long)]
        root: PathBuf,
    },

    /// Approve a plan by writing its token
    Approve {
        /// Path to the plan file
        #[arg(long)]
        plan: PathBuf,
    },

    /// Apply an approved plan
    ///
    /// Examples:
    ///   tidy apply --plan P --dry-run   # Required once before a real apply
    ///   tidy apply --plan P             # Move files
    Apply {
        /// Path to the plan file
        #[arg(long)]
        plan: PathBuf,

        /// List actions and record a dry run without moving anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the derived state of a plan
    Status {
        /// Path to the plan file
        #[arg(long)]
        plan: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Record the current inventory of a tree
    Snapshot {
        /// Root of the managed tree
        #[arg(long)]
        root: PathBuf,

        /// Fingerprint every file
        #[arg(long)]
        hash: bool,
    },
}
