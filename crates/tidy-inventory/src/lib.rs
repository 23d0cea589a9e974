//! File inventory for tidy
//!
//! An inventory is an ordered list of [`FileRecord`]s under a root, with the
//! `_meta` subtree excluded. Several [`InventoryProvider`] backends can
//! produce one; [`ProviderSelector`] holds the "prefer the indexed backend,
//! fall back to a raw walk" policy in one place.
//!
//! Snapshots and extension reports are built on top of an inventory.

pub mod error;
pub mod everything;
pub mod everything_http;
pub mod local;
mod process;
pub mod provider;
pub mod record;
pub mod report;
pub mod selector;
pub mod snapshot;

pub use error::{Error, Result};
pub use everything::{EverythingCliProvider, find_es_exe};
pub use everything_http::EverythingHttpProvider;
pub use local::LocalWalkProvider;
pub use provider::InventoryProvider;
pub use record::FileRecord;
pub use report::{ExtensionReport, write_report};
pub use selector::ProviderSelector;
pub use snapshot::{SnapshotEntry, create_snapshot, load_snapshot};
