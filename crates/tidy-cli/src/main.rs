//! tidy CLI
//!
//! Plan, approve and apply file reorganizations under a managed root.

mod cli;
mod commands;
mod error;

use clap::Parser;
use clap::error::ErrorKind;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::{EXIT_USAGE, Result};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => EXIT_USAGE,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    if let Err(e) = execute_command(cli.command) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

/// Install a stderr subscriber when `-v` or `RUST_LOG` asks for one.
fn init_tracing(verbose: bool) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("debug"),
        Err(_) => return,
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
    tracing::debug!("Tracing enabled");
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Report { root } => commands::run_report(&root),
        Commands::Plan { root } => commands::run_plan(&root),
        Commands::Approve { plan } => commands::run_approve(&plan),
        Commands::Apply { plan, dry_run } => commands::run_apply(&plan, dry_run),
        Commands::Status { plan, json } => commands::run_status(&plan, json),
        Commands::Snapshot { root, hash } => commands::run_snapshot(&root, hash),
    }
}
