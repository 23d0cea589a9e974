//! Filesystem primitives for tidy
//!
//! Streaming content fingerprints, atomic and no-clobber file operations,
//! the `_meta` layout, and format-agnostic config loading.

pub mod config;
pub mod constants;
pub mod error;
pub mod fingerprint;
pub mod io;
pub mod layout;
pub mod path;

pub use config::{ConfigFormat, ConfigStore};
pub use constants::{META_DIR_NAME, MetaDir, QUARANTINE_DIR_NAME};
pub use error::{Error, Result};
pub use fingerprint::{fingerprint_bytes, fingerprint_file, fingerprint_reader};
pub use layout::MetaLayout;
pub use path::NormalizedPath;
