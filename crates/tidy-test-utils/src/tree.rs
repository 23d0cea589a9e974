//! [`TestTree`] builder for scratch directory trees.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary managed root with helpers for setup and assertion.
///
/// # Example
///
/// ```rust,no_run
/// use tidy_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// tree.write("downloads/a.tmp", "scratch");
/// tree.assert_file_exists("downloads/a.tmp");
/// ```
pub struct TestTree {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Create an empty tree rooted at a canonical temporary path.
    ///
    /// Canonicalizing up front keeps paths comparable with the ones
    /// `MetaLayout::ensure` writes into plans (macOS `/var` is a symlink).
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("TestTree::new: failed to create temp dir");
        let root = dunce::canonicalize(temp_dir.path())
            .expect("TestTree::new: failed to canonicalize temp dir");
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    /// Return the root path of the tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `rel` inside the tree.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("TestTree::write: mkdir {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TestTree::write: {}: {e}", path.display()));
        path
    }

    /// Read `rel` as UTF-8.
    pub fn read(&self, rel: &str) -> String {
        let path = self.path(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("TestTree::read: {}: {e}", path.display()))
    }

    /// Sorted relative paths of every regular file, `_meta` included.
    pub fn files(&self) -> Vec<String> {
        fn visit(dir: &Path, root: &Path, out: &mut Vec<String>) {
            let Ok(entries) = fs::read_dir(dir) else { return };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    visit(&path, root, out);
                } else if let Ok(rel) = path.strip_prefix(root) {
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        let mut out = Vec::new();
        visit(&self.root, &self.root, &mut out);
        out.sort();
        out
    }

    /// Assert that `rel` exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `rel` does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}
