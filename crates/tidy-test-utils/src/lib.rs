//! Shared test utilities for the tidy workspace.
//!
//! Dev-dependency only; never published.
//!
//! - [`TestTree`]: a scratch directory tree with write and assertion helpers

pub mod tree;

pub use tree::TestTree;
