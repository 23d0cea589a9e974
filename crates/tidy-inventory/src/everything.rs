//! Indexed enumeration through the Everything `es` command-line client

use crate::process::run_with_deadline;
use crate::provider::records_under;
use crate::{Error, FileRecord, InventoryProvider, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Exit code `es` uses when the Everything service is not running.
const ES_NOT_RUNNING: i32 = 8;

/// Where installers put `es` when it is not on PATH.
const ES_INSTALL_PATHS: [&str; 3] = [
    r"C:\Program Files\Everything\es.exe",
    r"C:\Program Files (x86)\Everything\es.exe",
    r"C:\Tools\Everything\es.exe",
];

const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(5);
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Locate `es` on PATH, then in the usual install directories.
pub fn find_es_exe() -> Option<PathBuf> {
    let install_paths: Vec<PathBuf> = ES_INSTALL_PATHS.iter().map(PathBuf::from).collect();
    locate(which::which("es").ok(), &install_paths)
}

fn locate(on_path: Option<PathBuf>, install_paths: &[PathBuf]) -> Option<PathBuf> {
    on_path.or_else(|| install_paths.iter().find(|p| p.is_file()).cloned())
}

/// Queries the Everything index via `es`.
///
/// Much faster than walking large trees, but only present where Everything
/// is installed and running. `es` is asked for files only (`/a-d`), sorted by
/// path (`-s`); results are re-sorted locally so ordering never depends on
/// the index. Every invocation runs under a deadline, and a child that
/// overruns it is killed.
#[derive(Debug, Clone)]
pub struct EverythingCliProvider {
    executable: PathBuf,
    hash_files: bool,
    max_results: Option<usize>,
    availability_timeout: Duration,
    query_timeout: Duration,
}

impl Default for EverythingCliProvider {
    fn default() -> Self {
        Self {
            executable: find_es_exe().unwrap_or_else(|| PathBuf::from("es")),
            hash_files: false,
            max_results: None,
            availability_timeout: AVAILABILITY_TIMEOUT,
            query_timeout: QUERY_TIMEOUT,
        }
    }
}

impl EverythingCliProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `es` binary instead of searching for one.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_hashing(mut self, hash_files: bool) -> Self {
        self.hash_files = hash_files;
        self
    }

    /// Cap the number of results `es` returns.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Deadlines for the availability check and for a query.
    pub fn with_timeouts(mut self, availability: Duration, query: Duration) -> Self {
        self.availability_timeout = availability;
        self.query_timeout = query;
        self
    }

    fn failed(&self, message: impl Into<String>) -> Error {
        Error::ProviderFailed {
            provider: self.name().to_string(),
            message: message.into(),
        }
    }

    /// Turn `es` stdout into records, dropping meta paths and non-files.
    fn parse_output(&self, root: &Path, stdout: &str) -> Vec<FileRecord> {
        let paths = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect();
        records_under(root, paths, self.hash_files)
    }
}

impl InventoryProvider for EverythingCliProvider {
    fn name(&self) -> &str {
        "everything_es"
    }

    fn is_available(&self) -> bool {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("-get-result-count");
        match run_with_deadline(&mut cmd, self.availability_timeout) {
            Ok(Some(finished)) => finished.status.success(),
            Ok(None) => {
                tracing::warn!(
                    "{} did not answer within {:?}; treating as unavailable",
                    self.executable.display(),
                    self.availability_timeout
                );
                false
            }
            Err(_) => false,
        }
    }

    fn enumerate(&self, root: &Path) -> Result<Vec<FileRecord>> {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("-path").arg(root).arg("/a-d").arg("-s");
        if let Some(n) = self.max_results {
            cmd.arg("-n").arg(n.to_string());
        }

        let output = run_with_deadline(&mut cmd, self.query_timeout)
            .map_err(|e| Error::ProviderUnavailable {
                provider: self.name().to_string(),
                reason: format!("cannot run {}: {}", self.executable.display(), e),
            })?
            .ok_or_else(|| self.failed(format!("es timed out after {:?}", self.query_timeout)))?;

        match output.status.code() {
            Some(0) => {}
            Some(ES_NOT_RUNNING) => {
                return Err(self.failed("Everything is not running"));
            }
            code => {
                return Err(self.failed(format!(
                    "es exited with {:?}: {}",
                    code,
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let records = self.parse_output(root, &stdout);
        tracing::debug!(root = %root.display(), count = records.len(), "Everything query complete");
        Ok(records)
    }
}
