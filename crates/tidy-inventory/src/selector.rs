//! Ordered provider selection with fallback

use crate::{
    EverythingCliProvider, EverythingHttpProvider, FileRecord, InventoryProvider,
    LocalWalkProvider, Result,
};
use std::path::Path;

/// Chooses among inventory backends in preference order.
///
/// The first available provider is used. If it fails mid-enumeration the
/// selector downgrades to the fallback, which is always the local walk.
pub struct ProviderSelector {
    preferred: Vec<Box<dyn InventoryProvider>>,
    fallback: Box<dyn InventoryProvider>,
}

impl Default for ProviderSelector {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ProviderSelector {
    /// Indexed backends first (`es`, then the HTTP server), local walk as
    /// fallback.
    pub fn new(hash_files: bool) -> Self {
        Self {
            preferred: vec![
                Box::new(EverythingCliProvider::new().with_hashing(hash_files)),
                Box::new(EverythingHttpProvider::new().with_hashing(hash_files)),
            ],
            fallback: Box::new(LocalWalkProvider::new().with_hashing(hash_files)),
        }
    }

    /// Build a selector from an explicit preference list.
    pub fn with_providers(
        preferred: Vec<Box<dyn InventoryProvider>>,
        fallback: Box<dyn InventoryProvider>,
    ) -> Self {
        Self {
            preferred,
            fallback,
        }
    }

    /// The provider that would be tried first right now.
    pub fn select(&self) -> &dyn InventoryProvider {
        self.preferred
            .iter()
            .find(|p| p.is_available())
            .map(|p| p.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    /// Enumerate with the selected provider, falling back on failure.
    ///
    /// Returns the records and the name of the provider that produced them.
    pub fn enumerate(&self, root: &Path) -> Result<(Vec<FileRecord>, String)> {
        let selected = self.select();
        match selected.enumerate(root) {
            Ok(records) => Ok((records, selected.name().to_string())),
            Err(e) if !std::ptr::addr_eq(selected, self.fallback.as_ref()) => {
                tracing::warn!(
                    "Provider '{}' failed ({}); falling back to '{}'",
                    selected.name(),
                    e,
                    self.fallback.name()
                );
                let records = self.fallback.enumerate(root)?;
                Ok((records, self.fallback.name().to_string()))
            }
            Err(e) => Err(e),
        }
    }
}
