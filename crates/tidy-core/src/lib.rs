//! Plan, approval, audit and apply pipeline for tidy
//!
//! This crate holds everything that mutates a managed tree, and the durable
//! artifacts that gate it:
//!
//! - **Plans**: an immutable, declarative list of file actions plus policy
//! - **Approvals**: a per-plan token file whose existence authorizes apply
//! - **Audit ledger**: an append-only JSONL log, the authority for whether a
//!   plan has been dry-run and how far an apply got
//! - **Apply engine**: gate checks, dry run, and sequential per-action
//!   rename with pre/post verification and single-action rollback
//!
//! # Architecture
//!
//! ```text
//!                    tidy-cli
//!                        |
//!                    tidy-core
//!                        |
//!             +----------+----------+
//!             |                     |
//!          tidy-fs            tidy-inventory
//! ```
//!
//! Plan state is never stored. [`derive_status`] recomputes it from the
//! approval store, the ledger and the plan file on every call.

pub mod approval;
pub mod audit;
pub mod engine;
pub mod error;
pub mod plan;
pub mod state;

pub use approval::{ApprovalStore, ApprovalToken};
pub use audit::{AuditEvent, AuditLedger, EventKind};
pub use engine::{ApplyEngine, ApplyMode, ApplyOutcome, FileOps, LocalFileOps, Observation};
pub use error::{Error, Result};
pub use plan::{
    Action, ActionKind, Plan, PlanGenerator, Policy, ProposedAction, QuarantineRule, Rule, RuleSet,
};
pub use state::{PlanState, PlanStatus, derive_status};
